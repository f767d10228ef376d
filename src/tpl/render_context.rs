use crate::error::TplError;
use crate::value::Value;
use std::borrow::Cow;

/// Name lookup scope for one render.
///
/// Loop iterations never mutate a context: each one derives a child scope
/// that binds the loop variable and falls back to its parent.
pub struct Context<'a> {
    root: &'a Value,
    parent: Option<&'a Context<'a>>,
    binding: Option<(&'a str, &'a Value)>,
}

impl<'a> Context<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            parent: None,
            binding: None,
        }
    }

    /// A child scope where `name` resolves to `value`, shadowing any outer
    /// binding of the same name.
    pub fn bind(&'a self, name: &'a str, value: &'a Value) -> Context<'a> {
        Context {
            root: self.root,
            parent: Some(self),
            binding: Some((name, value)),
        }
    }

    fn get_from_scope(&self, key: &str) -> Option<&'a Value> {
        let mut scope = Some(self);
        while let Some(ctx) = scope {
            if let Some((name, value)) = ctx.binding {
                if name == key {
                    return Some(value);
                }
            }
            scope = ctx.parent;
        }
        match self.root {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Resolve a dotted path such as `user.posts.count`.
    ///
    /// `count` on a list yields its length unless a map key shadows it.
    pub fn lookup(&self, path: &str) -> Result<Cow<'a, Value>, TplError> {
        let not_found = || TplError::VariableNotFound(path.to_string());

        let mut parts = path.split('.').peekable();
        let head = parts.next().unwrap_or_default();
        let mut current = self.get_from_scope(head).ok_or_else(not_found)?;

        while let Some(part) = parts.next() {
            current = match current {
                Value::Map(m) => m.get(part).ok_or_else(not_found)?,
                Value::List(items) if part == "count" && parts.peek().is_none() => {
                    return Ok(Cow::Owned(Value::UInt(items.len() as u64)));
                }
                _ => return Err(not_found()),
            };
        }
        Ok(Cow::Borrowed(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn test_lookup_simple() {
        let root = map(vec![("a", Value::Int(1))]);
        let ctx = Context::new(&root);

        assert_eq!(*ctx.lookup("a").unwrap(), Value::Int(1));
        assert!(matches!(ctx.lookup("b"), Err(TplError::VariableNotFound(p)) if p == "b"));
    }

    #[test]
    fn test_lookup_nested() {
        let root = map(vec![("user", map(vec![("name", Value::from("Niko"))]))]);
        let ctx = Context::new(&root);

        assert_eq!(*ctx.lookup("user.name").unwrap(), Value::from("Niko"));
        assert!(ctx.lookup("user.email").is_err());
        assert!(ctx.lookup("user.name.first").is_err());
        assert!(ctx.lookup("x.y").is_err());
    }

    #[test]
    fn test_lookup_count() {
        let root = map(vec![
            ("names", Value::from(vec!["A", "B", "C"])),
            ("stats", map(vec![("count", Value::Int(42))])),
        ]);
        let ctx = Context::new(&root);

        assert_eq!(*ctx.lookup("names.count").unwrap(), Value::UInt(3));
        assert_eq!(*ctx.lookup("stats.count").unwrap(), Value::Int(42));
        assert!(ctx.lookup("names.count.more").is_err());
        assert!(ctx.lookup("names.length").is_err());
    }

    #[test]
    fn test_bind_shadows_only_in_child() {
        let root = map(vec![("a", Value::Int(1)), ("b", Value::Int(2))]);
        let ctx = Context::new(&root);
        let shadow = Value::Int(10);
        let child = ctx.bind("a", &shadow);

        assert_eq!(*child.lookup("a").unwrap(), Value::Int(10));
        assert_eq!(*child.lookup("b").unwrap(), Value::Int(2));
        assert_eq!(*ctx.lookup("a").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_nested_bindings() {
        let root = Value::empty_map();
        let ctx = Context::new(&root);
        let outer = map(vec![("name", Value::from("outer"))]);
        let inner = Value::from("inner");
        let first = ctx.bind("item", &outer);
        let second = first.bind("label", &inner);

        assert_eq!(*second.lookup("item.name").unwrap(), Value::from("outer"));
        assert_eq!(*second.lookup("label").unwrap(), Value::from("inner"));
    }
}
