//! Scope resolution invariants

use basesync::namespace::{Namespace, ProjectRef};
use basesync::scope::{resolve, CwdContext, ScopeSelector, Selector};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,8}".prop_filter("reserved token", |n| n != "all")
}

proptest! {
    #[test]
    fn explicit_pair_resolves_the_same_everywhere(category in name(), project in name(), inner in name()) {
        let args = vec![category.clone(), project.clone()];
        let expected = ScopeSelector::project(category.clone(), project.clone());
        for cwd in [
            CwdContext::Outside,
            CwdContext::Base,
            CwdContext::Category(inner.clone()),
            CwdContext::Project { category: inner.clone(), project: inner.clone() },
        ] {
            prop_assert_eq!(resolve(&cwd, &args).unwrap(), expected.clone());
        }
    }

    #[test]
    fn project_directory_infers_itself(category in name(), project in name()) {
        let cwd = CwdContext::Project { category: category.clone(), project: project.clone() };
        prop_assert_eq!(resolve(&cwd, &[]).unwrap(), ScopeSelector::project(category, project));
    }

    #[test]
    fn all_then_name_is_always_rejected(project in name()) {
        let args = vec!["all".to_string(), project];
        prop_assert!(resolve(&CwdContext::Outside, &args).is_err());
    }

    #[test]
    fn named_project_requires_named_category(project in name()) {
        prop_assert!(ScopeSelector::new(Selector::None, Selector::Named(project.clone())).is_err());
        prop_assert!(ScopeSelector::new(Selector::All, Selector::Named(project)).is_err());
    }

    #[test]
    fn separators_never_resolve(category in name(), suffix in name()) {
        let args = vec![category, format!("x/{}", suffix)];
        prop_assert!(resolve(&CwdContext::Outside, &args).is_err());
    }

    #[test]
    fn project_maps_to_one_path_per_store(category in name(), project in name()) {
        let ns = Namespace::new("/kb", "app:");
        let p = ProjectRef::new(category.clone(), project.clone());
        prop_assert_eq!(ns.project_local(&p), std::path::PathBuf::from("/kb").join(&category).join(&project));
        prop_assert_eq!(ns.project_remote(&p), format!("app:/{}/{}", category, project));
    }
}
