use crate::HashMap;
use crate::ident::Ident;
use crate::source::Loc;

/// The definition record of a macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInfo {
    pub replacement: String,
}

/// One `#define` or `#undef` directive. An undef carries no definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDirective {
    pub loc: Loc,
    pub info: Option<MacroInfo>,
}

impl MacroDirective {
    pub fn define(loc: Loc, replacement: &str) -> Self {
        MacroDirective { loc, info: Some(MacroInfo { replacement: replacement.to_owned() }) }
    }

    pub fn undef(loc: Loc) -> Self {
        MacroDirective { loc, info: None }
    }

    pub fn is_definition(&self) -> bool {
        self.info.is_some()
    }
}

/// The preprocessor's registry of macro directives.
///
/// Macros live in a separate namespace from declarations. The directives
/// for one name form a stack whose top decides whether the macro is
/// currently defined; removing a directive from the middle reinstates the
/// state below it, so reverting a redefinition exposes the previous
/// definition again.
#[derive(Debug, Default)]
pub struct MacroRegistry {
    directives: HashMap<Ident, Vec<MacroDirective>>,
}

impl MacroRegistry {
    /// Record a `#define`, returning the directive for transaction
    /// bookkeeping.
    pub fn define(&mut self, name: Ident, loc: Loc, replacement: &str) -> MacroDirective {
        let directive = MacroDirective::define(loc, replacement);
        self.directives.entry(name).or_default().push(directive.clone());
        directive
    }

    /// Record a `#undef`, returning the directive for transaction
    /// bookkeeping.
    pub fn undef(&mut self, name: Ident, loc: Loc) -> MacroDirective {
        let directive = MacroDirective::undef(loc);
        self.directives.entry(name).or_default().push(directive.clone());
        directive
    }

    /// The active definition, if the macro is currently defined.
    pub fn active(&self, name: &Ident) -> Option<&MacroInfo> {
        self.directives.get(name)?.last()?.info.as_ref()
    }

    pub fn is_defined(&self, name: &Ident) -> bool {
        self.active(name).is_some()
    }

    /// Detach one recorded directive. Returns whether it was present.
    pub fn remove_directive(&mut self, name: &Ident, directive: &MacroDirective) -> bool {
        let Some(stack) = self.directives.get_mut(name) else {
            return false;
        };
        let Some(idx) = stack.iter().rposition(|d| d == directive) else {
            return false;
        };
        stack.remove(idx);
        if stack.is_empty() {
            self.directives.remove(name);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileId;

    fn loc(offset: u32) -> Loc {
        Loc::new(FileId(0), offset)
    }

    #[test]
    fn removing_a_redefinition_reinstates_the_previous_one() {
        let mut registry = MacroRegistry::default();
        let name = Ident::from_string("MAX");
        registry.define(name.clone(), loc(0), "1");
        let second = registry.define(name.clone(), loc(10), "2");
        assert_eq!(registry.active(&name).unwrap().replacement, "2");

        assert!(registry.remove_directive(&name, &second));
        assert_eq!(registry.active(&name).unwrap().replacement, "1");
        assert!(!registry.remove_directive(&name, &second));
    }

    #[test]
    fn undef_hides_the_definition() {
        let mut registry = MacroRegistry::default();
        let name = Ident::from_string("FLAG");
        let definition = registry.define(name.clone(), loc(0), "1");
        registry.undef(name.clone(), loc(5));
        assert!(!registry.is_defined(&name));

        // removing the buried definition leaves the macro undefined
        assert!(registry.remove_directive(&name, &definition));
        assert!(!registry.is_defined(&name));
    }
}
