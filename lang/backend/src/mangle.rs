use quill_lang_ast::{DeclGraph, DeclId, DeclKind};

/// Prefix of the per-variable initialization helpers emitted for globals
/// with dynamic initializers. The helpers run at most once, from the
/// module initializer.
pub const STATIC_INIT_PREFIX: &str = "__var_init.";

/// Prefix of the per-translation-unit initializer that calls the helpers.
pub const MODULE_INIT_PREFIX: &str = "__tu_init.";

/// The generated entry points a single source constructor may lower to.
/// Removal has to be attempted for each of them, regardless of which were
/// actually emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtorVariant {
    /// Complete object constructor.
    Complete,
    /// Base object constructor.
    Base,
    /// Complete object allocating constructor.
    CompleteAllocating,
}

impl CtorVariant {
    pub const ALL: [CtorVariant; 3] =
        [CtorVariant::Complete, CtorVariant::Base, CtorVariant::CompleteAllocating];

    pub fn suffix(self) -> &'static str {
        match self {
            CtorVariant::Complete => "C1",
            CtorVariant::Base => "C2",
            CtorVariant::CompleteAllocating => "C3",
        }
    }
}

/// Compute the generated-code symbol name of a declaration, or `None` for
/// entities that never receive one (anonymous declarations).
///
/// Function-local statics lower to a single qualified global named after
/// the owning function: `<function>.<variable>`.
pub fn mangled_name(graph: &DeclGraph, id: DeclId) -> Option<String> {
    let decl = graph.arena.get(id)?;
    if let DeclKind::Var(v) = &decl.kind {
        if v.is_static_local {
            let func = decl.lexical_parent?;
            let base = mangled_name(graph, func)?;
            return Some(format!("{base}.{}", decl.name.as_ref()?));
        }
    }
    let name = decl.name.as_ref()?;
    let mut segments = vec![name.to_string()];
    let mut cur = decl.semantic_parent;
    while let Some(parent) = cur {
        let parent = graph.arena.get(parent)?;
        if let Some(name) = &parent.name {
            segments.push(name.to_string());
        }
        cur = parent.semantic_parent;
    }
    segments.reverse();
    Some(segments.join("::"))
}

/// The symbol name of one constructor entry-point variant.
pub fn mangled_ctor_name(graph: &DeclGraph, id: DeclId, variant: CtorVariant) -> Option<String> {
    Some(format!("{}.{}", mangled_name(graph, id)?, variant.suffix()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_lang_ast::{ContainerData, FunctionData, Ident, Loc, VarData};

    #[test]
    fn nested_names_are_qualified() {
        let mut graph = DeclGraph::new();
        let root = graph.root;
        let ns = graph.declare(
            root,
            Some(Ident::from_string("math")),
            Loc::builtin(),
            DeclKind::Namespace(ContainerData::default()),
        );
        let f = graph.declare(
            ns,
            Some(Ident::from_string("gcd")),
            Loc::builtin(),
            DeclKind::Function(FunctionData::default()),
        );
        assert_eq!(mangled_name(&graph, f).as_deref(), Some("math::gcd"));
    }

    #[test]
    fn static_locals_are_named_after_their_function() {
        let mut graph = DeclGraph::new();
        let root = graph.root;
        let f = graph.declare(
            root,
            Some(Ident::from_string("counter")),
            Loc::builtin(),
            DeclKind::Function(FunctionData::default()),
        );
        let v = graph.declare_local(
            f,
            Some(Ident::from_string("calls")),
            Loc::builtin(),
            VarData { is_static_local: true, ..Default::default() },
        );
        assert_eq!(mangled_name(&graph, v).as_deref(), Some("counter.calls"));
    }

    #[test]
    fn ctor_variants_get_distinct_symbols() {
        let mut graph = DeclGraph::new();
        let root = graph.root;
        let record = graph.declare(
            root,
            Some(Ident::from_string("Widget")),
            Loc::builtin(),
            DeclKind::Record(Default::default()),
        );
        let ctor = graph.declare(
            record,
            Some(Ident::from_string("Widget")),
            Loc::builtin(),
            DeclKind::Constructor(FunctionData::default()),
        );
        let names: Vec<_> = CtorVariant::ALL
            .iter()
            .map(|v| mangled_ctor_name(&graph, ctor, *v).unwrap())
            .collect();
        assert_eq!(names, vec!["Widget::Widget.C1", "Widget::Widget.C2", "Widget::Widget.C3"]);
    }

    #[test]
    fn anonymous_declarations_have_no_symbol() {
        let mut graph = DeclGraph::new();
        let root = graph.root;
        let ns = graph.declare(
            root,
            None,
            Loc::builtin(),
            DeclKind::Namespace(ContainerData::default()),
        );
        assert_eq!(mangled_name(&graph, ns), None);
    }
}
