use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Clone, Debug)]
pub enum ScopeError {
    #[error("Identifier {0} already declared")]
    AlreadyDeclared(String),
}

/// Index of a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone)]
struct Scope<V, C> {
    parent: Option<ScopeId>,
    locals: HashMap<String, V>,
    ctx: C,
}

/// A tree of lexical scopes held in one arena, addressed by `ScopeId`.
///
/// Each scope owns a local name map and an ambient context value `C`
/// that children inherit (a clone) at creation time. Lookup walks the
/// parent chain; declaration goes into one scope only and refuses to
/// shadow any visible binding.
#[derive(Debug, Clone)]
pub struct ScopeChain<V, C> {
    scopes: Vec<Scope<V, C>>,
}

impl<V, C: Clone> ScopeChain<V, C> {
    pub fn with_root(ctx: C) -> Self {
        ScopeChain {
            scopes: vec![Scope {
                parent: None,
                locals: HashMap::new(),
                ctx,
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Opens a new child scope of `parent` with an inherited context
    /// and an empty local map.
    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let ctx = self.scopes[parent.0].ctx.clone();
        self.scopes.push(Scope {
            parent: Some(parent),
            locals: HashMap::new(),
            ctx,
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn ctx(&self, scope: ScopeId) -> &C {
        &self.scopes[scope.0].ctx
    }

    /// Overrides the inherited ambient context of a freshly opened scope.
    pub fn ctx_mut(&mut self, scope: ScopeId) -> &mut C {
        &mut self.scopes[scope.0].ctx
    }

    /// Inserts into the local map of `scope` only. Fails when the name
    /// already resolves anywhere along the chain.
    pub fn declare(&mut self, scope: ScopeId, name: &str, value: V) -> Result<(), ScopeError> {
        if self.resolve(scope, name).is_some() {
            return Err(ScopeError::AlreadyDeclared(name.to_string()));
        }

        self.scopes[scope.0].locals.insert(name.to_string(), value);
        Ok(())
    }

    /// Nearest binding for `name`, searching `scope` first and then its
    /// ancestors.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<&V> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(value) = scope.locals.get(name) {
                return Some(value);
            }
            current = scope.parent;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_through_parent_chain() {
        let mut chain: ScopeChain<i32, bool> = ScopeChain::with_root(false);
        let root = chain.root();
        chain.declare(root, "x", 1).unwrap();

        let inner = chain.child(root);
        let innermost = chain.child(inner);
        assert_eq!(chain.resolve(innermost, "x"), Some(&1));
        assert_eq!(chain.resolve(innermost, "y"), None);
    }

    #[test]
    fn local_binding_wins_over_ancestors() {
        let mut chain: ScopeChain<i32, ()> = ScopeChain::with_root(());
        let root = chain.root();
        chain.declare(root, "x", 1).unwrap();

        // declare() refuses shadowing, so force the layout by hand
        let inner = chain.child(root);
        chain.scopes[1].locals.insert("x".to_string(), 2);
        assert_eq!(chain.resolve(inner, "x"), Some(&2));
        assert_eq!(chain.resolve(root, "x"), Some(&1));
    }

    #[test]
    fn declaration_refuses_shadowing() {
        let mut chain: ScopeChain<i32, bool> = ScopeChain::with_root(false);
        let root = chain.root();
        chain.declare(root, "x", 1).unwrap();

        let inner = chain.child(root);
        assert!(matches!(
            chain.declare(inner, "x", 2),
            Err(ScopeError::AlreadyDeclared(_))
        ));
    }

    #[test]
    fn children_inherit_context_once() {
        let mut chain: ScopeChain<i32, bool> = ScopeChain::with_root(false);
        let root = chain.root();

        let loop_scope = chain.child(root);
        *chain.ctx_mut(loop_scope) = true;
        let body = chain.child(loop_scope);
        assert!(*chain.ctx(body));

        let sibling = chain.child(root);
        assert!(!*chain.ctx(sibling));
    }
}
