// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native module registry.
//
// Built once at startup from the platform's base modules followed by the
// application's own list. Registration is explicit and ordered; there is
// no discovery and no registration after `build`. Duplicate names are a
// startup fault: the first registration is never silently shadowed.

use std::collections::HashMap;

use mallard_core::error::{MallardError, Result};
use tracing::{error, info, instrument};

use crate::traits::NativeModule;

/// Immutable, name-indexed set of native modules.
pub struct ModuleRegistry {
    modules: Vec<Box<dyn NativeModule>>,
    index: HashMap<String, usize>,
}

impl ModuleRegistry {
    /// Concatenate `base` then `extra` into a registry.
    ///
    /// Fails on an empty module name, a module declaring a method twice, or
    /// two modules sharing a name. Positions in errors count across both
    /// lists.
    #[instrument(skip_all, fields(base = base.len(), extra = extra.len()))]
    pub fn build(
        base: Vec<Box<dyn NativeModule>>,
        extra: Vec<Box<dyn NativeModule>>,
    ) -> Result<Self> {
        let mut modules: Vec<Box<dyn NativeModule>> = Vec::with_capacity(base.len() + extra.len());
        let mut index = HashMap::with_capacity(modules.capacity());

        for (position, module) in base.into_iter().chain(extra).enumerate() {
            let name = module.name().to_string();
            if name.is_empty() {
                error!(position, "native module with empty name");
                return Err(MallardError::InvalidModuleName(position));
            }

            if let Some(method) = module.methods().duplicates().first() {
                error!(module = %name, method = %method, "method exported twice");
                return Err(MallardError::DuplicateMethod {
                    module: name,
                    method: method.clone(),
                });
            }

            if let Some(&first) = index.get(&name) {
                error!(module = %name, first, second = position, "duplicate native module");
                return Err(MallardError::DuplicateRegistration {
                    name,
                    first,
                    second: position,
                });
            }

            index.insert(name, position);
            modules.push(module);
        }

        let registry = Self { modules, index };
        info!(modules = ?registry.names(), "native module registry built");
        Ok(registry)
    }

    /// Look up a module by name.
    pub fn resolve(&self, name: &str) -> Option<&dyn NativeModule> {
        self.index.get(name).map(|&i| self.modules[i].as_ref())
    }

    /// Module names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn NativeModule> {
        self.modules.iter().map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MethodTable;
    use mallard_core::types::{Arity, Value};

    struct Named {
        name: &'static str,
        methods: MethodTable,
    }

    fn module(name: &'static str) -> Box<dyn NativeModule> {
        Box::new(Named {
            name,
            methods: MethodTable::new().sync_method("id", Arity::Exact(0), move |_| {
                Ok(Value::from(name))
            }),
        })
    }

    impl NativeModule for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn methods(&self) -> &MethodTable {
            &self.methods
        }
    }

    #[test]
    fn base_then_extra_order() {
        let registry = ModuleRegistry::build(vec![module("A"), module("B")], vec![module("C")])
            .unwrap();
        assert_eq!(registry.names(), ["A", "B", "C"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.resolve("B").unwrap().name(), "B");
        assert!(registry.resolve("Z").is_none());
    }

    #[test]
    fn every_registered_name_resolves_to_its_module() {
        let names = ["Alpha", "Beta", "Gamma", "Delta"];
        let registry =
            ModuleRegistry::build(names.into_iter().map(module).collect(), Vec::new()).unwrap();
        for name in names {
            assert_eq!(registry.resolve(name).unwrap().name(), name);
        }
        assert!(registry.resolve("alpha").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn duplicate_across_lists_is_rejected() {
        let err = ModuleRegistry::build(vec![module("A"), module("B")], vec![module("A")])
            .unwrap_err();
        match err {
            MallardError::DuplicateRegistration { name, first, second } => {
                assert_eq!(name, "A");
                assert_eq!(first, 0);
                assert_eq!(second, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_outcome_is_repeatable() {
        for _ in 0..16 {
            let err = ModuleRegistry::build(vec![module("X")], vec![module("Y"), module("X")])
                .unwrap_err();
            assert!(matches!(
                err,
                MallardError::DuplicateRegistration { first: 0, second: 2, .. }
            ));
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = ModuleRegistry::build(vec![module("A")], vec![module("")]).unwrap_err();
        assert!(matches!(err, MallardError::InvalidModuleName(1)));
        assert!(err.is_registration_fault());
    }

    #[test]
    fn duplicate_method_is_rejected() {
        let twice: Box<dyn NativeModule> = Box::new(Named {
            name: "Twice",
            methods: MethodTable::new()
                .sync_method("go", Arity::Any, |_| Ok(Value::Null))
                .sync_method("go", Arity::Any, |_| Ok(Value::Null)),
        });
        let err = ModuleRegistry::build(vec![twice], Vec::new()).unwrap_err();
        assert!(matches!(err, MallardError::DuplicateMethod { ref method, .. } if method == "go"));
    }

    #[test]
    fn empty_registry() {
        let registry = ModuleRegistry::build(Vec::new(), Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }
}
