#[cfg(test)]
mod tests {
    use crate::config::{default_rules, ChainRule};
    use crate::error::BuildError;
    use crate::resolver::ChainRegistry;

    fn registry() -> ChainRegistry {
        ChainRegistry::from_rules(&default_rules()).unwrap()
    }

    #[test]
    fn test_wildcard_patterns_match_both_forms() {
        let registry = registry();
        assert_eq!(registry.resolve(".js").unwrap(), &["script".to_string()]);
        assert_eq!(registry.resolve(".jsx").unwrap(), &["script".to_string()]);
        assert_eq!(
            registry.resolve(".ts").unwrap(),
            &["typescript".to_string(), "script".to_string()]
        );
        assert_eq!(registry.resolve(".scss").unwrap(), &["style".to_string()]);
        assert_eq!(registry.resolve(".css").unwrap(), &["style".to_string()]);
    }

    #[test]
    fn test_exact_match_wins_over_wildcard() {
        // A wildcard that would also match .svelte must not shadow the
        // exact registration, regardless of declaration order.
        let rules = vec![
            ChainRule {
                test: ".s.*".to_string(),
                stages: vec!["style".to_string()],
            },
            ChainRule {
                test: ".svelte".to_string(),
                stages: vec!["template".to_string()],
            },
        ];
        let registry = ChainRegistry::from_rules(&rules).unwrap();
        assert_eq!(
            registry.resolve(".svelte").unwrap(),
            &["template".to_string()]
        );
    }

    #[test]
    fn test_unregistered_extension_is_unsupported() {
        let registry = registry();
        match registry.resolve(".png") {
            Err(BuildError::UnsupportedExtension(ext)) => assert_eq!(ext, ".png"),
            other => panic!("expected UnsupportedExtension, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let registry = registry();
        let first = registry.resolve(".js").unwrap().to_vec();
        let second = registry.resolve(".js").unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let rules = vec![ChainRule {
            test: ".zen".to_string(),
            stages: vec![],
        }];
        assert!(matches!(
            ChainRegistry::from_rules(&rules),
            Err(BuildError::Config(_))
        ));
    }
}
