use crate::HashMap;
use crate::arena::DeclId;
use crate::ident::Ident;
use crate::lookup::LookupTable;
use crate::source::Loc;

// Declarations
//
//

/// One entity introduced by compiled input.
///
/// Declarations live in a [`crate::DeclArena`]; removing one is the job of
/// the reverter in the driver crate, which must keep every invariant of
/// the structures below intact.
#[derive(Debug, Clone)]
pub struct Decl {
    /// Anonymous declarations participate in no lookup table.
    pub name: Option<Ident>,
    /// Where the declaration was spelled.
    pub loc: Loc,
    /// The container this declaration is physically nested in.
    pub lexical_parent: Option<DeclId>,
    /// The container this declaration is logically a member of. Differs
    /// from the lexical parent for out-of-line member definitions.
    pub semantic_parent: Option<DeclId>,
    /// The next older redeclaration of the same entity.
    pub previous: Option<DeclId>,
    /// Cached head of the redeclaration chain. Points at the declaration
    /// itself for singleton chains.
    pub most_recent: DeclId,
    pub kind: DeclKind,
}

impl Decl {
    pub fn container(&self) -> Option<&ContainerData> {
        match &self.kind {
            DeclKind::TranslationUnit(c) | DeclKind::Namespace(c) | DeclKind::Tag(c) => Some(c),
            DeclKind::Record(r) => Some(&r.container),
            DeclKind::Function(f) | DeclKind::Constructor(f) => Some(&f.container),
            DeclKind::ClassTemplateSpecialization(s) => Some(&s.container),
            _ => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.kind {
            DeclKind::TranslationUnit(c) | DeclKind::Namespace(c) | DeclKind::Tag(c) => Some(c),
            DeclKind::Record(r) => Some(&mut r.container),
            DeclKind::Function(f) | DeclKind::Constructor(f) => Some(&mut f.container),
            DeclKind::ClassTemplateSpecialization(s) => Some(&mut s.container),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.container().is_some()
    }

    /// Whether this is a record's implicit internal alias to itself. Such
    /// a companion node is never reverted on its own; it goes away with
    /// its owning record.
    pub fn is_injected_self_ref(&self) -> bool {
        matches!(&self.kind, DeclKind::Record(r) if r.injected_self_ref)
    }

    pub fn specializations(&self) -> Option<&SpecializationSet> {
        match &self.kind {
            DeclKind::FunctionTemplate(t) | DeclKind::ClassTemplate(t) => {
                Some(&t.specializations)
            }
            _ => None,
        }
    }

    pub fn specializations_mut(&mut self) -> Option<&mut SpecializationSet> {
        match &mut self.kind {
            DeclKind::FunctionTemplate(t) | DeclKind::ClassTemplate(t) => {
                Some(&mut t.specializations)
            }
            _ => None,
        }
    }
}

/// The closed set of declaration variants the reverter dispatches on.
#[derive(Debug, Clone)]
pub enum DeclKind {
    /// The root of the declaration graph; never reverted.
    TranslationUnit(ContainerData),
    Namespace(ContainerData),
    /// A non-record tag type, e.g. an enum.
    Tag(ContainerData),
    Record(RecordData),
    Typedef,
    Using(UsingData),
    UsingShadow(UsingShadowData),
    Var(VarData),
    Function(FunctionData),
    Constructor(FunctionData),
    FunctionTemplate(TemplateData),
    ClassTemplate(TemplateData),
    ClassTemplateSpecialization(SpecializationData),
    /// Anything without structure the reverter knows about; removed from
    /// its container only.
    Other,
}

impl DeclKind {
    pub fn tag(&self) -> DeclTag {
        match self {
            DeclKind::TranslationUnit(_) => DeclTag::TranslationUnit,
            DeclKind::Namespace(_) => DeclTag::Namespace,
            DeclKind::Tag(_) => DeclTag::Tag,
            DeclKind::Record(_) => DeclTag::Record,
            DeclKind::Typedef => DeclTag::Typedef,
            DeclKind::Using(_) => DeclTag::Using,
            DeclKind::UsingShadow(_) => DeclTag::UsingShadow,
            DeclKind::Var(_) => DeclTag::Var,
            DeclKind::Function(_) => DeclTag::Function,
            DeclKind::Constructor(_) => DeclTag::Constructor,
            DeclKind::FunctionTemplate(_) => DeclTag::FunctionTemplate,
            DeclKind::ClassTemplate(_) => DeclTag::ClassTemplate,
            DeclKind::ClassTemplateSpecialization(_) => DeclTag::ClassTemplateSpecialization,
            DeclKind::Other => DeclTag::Other,
        }
    }
}

/// Payload-free copy of the [`DeclKind`] discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclTag {
    TranslationUnit,
    Namespace,
    Tag,
    Record,
    Typedef,
    Using,
    UsingShadow,
    Var,
    Function,
    Constructor,
    FunctionTemplate,
    ClassTemplate,
    ClassTemplateSpecialization,
    Other,
}

/// The child list and name lookup table of a container declaration.
#[derive(Debug, Clone, Default)]
pub struct ContainerData {
    /// Children in declaration order.
    pub children: Vec<DeclId>,
    pub lookup: LookupTable,
}

#[derive(Debug, Clone, Default)]
pub struct RecordData {
    pub container: ContainerData,
    /// Set on the record's implicit internal alias to itself.
    pub injected_self_ref: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VarData {
    pub is_parameter: bool,
    /// A function-local `static`. Code generation lowers it to a single
    /// qualified global named after the owning function.
    pub is_static_local: bool,
    /// Set inside templated, uninstantiated contexts, which never produce
    /// generated symbols.
    pub in_templated_context: bool,
    pub has_initializer: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FunctionData {
    /// Parameters are logical children of the function.
    pub container: ContainerData,
    /// Local declarations of the function body, in declaration order.
    pub body_locals: Vec<DeclId>,
    /// Present when this function is a specialization of a function
    /// template. Only the canonical declaration is registered in the
    /// template's specialization set.
    pub specialization: Option<SpecializationLink>,
}

#[derive(Debug, Clone)]
pub struct SpecializationLink {
    pub template: DeclId,
    pub args: TemplateArgs,
}

#[derive(Debug, Clone, Default)]
pub struct UsingData {
    /// The shadow declarations this using-declaration introduced.
    pub shadows: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub struct UsingShadowData {
    pub using_decl: DeclId,
}

#[derive(Debug, Clone)]
pub struct TemplateData {
    /// The generic declaration this template parameterizes.
    pub templated: DeclId,
    pub specializations: SpecializationSet,
}

impl TemplateData {
    pub fn new(templated: DeclId) -> Self {
        TemplateData { templated, specializations: SpecializationSet::default() }
    }
}

#[derive(Debug, Clone)]
pub struct SpecializationData {
    /// A class template specialization is itself a record.
    pub container: ContainerData,
    pub template: DeclId,
    pub args: TemplateArgs,
}

// Template specialization sets
//
//

/// The argument list a specialization was instantiated with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateArgs(pub Vec<String>);

impl TemplateArgs {
    pub fn new(args: &[&str]) -> Self {
        TemplateArgs(args.iter().map(|a| (*a).to_owned()).collect())
    }
}

/// A template's registry of its specialized forms, keyed by argument
/// list. A removed specialization must not leave a stale slot reachable
/// by a later lookup with the same arguments.
#[derive(Debug, Clone, Default)]
pub struct SpecializationSet {
    by_args: HashMap<TemplateArgs, DeclId>,
}

impl SpecializationSet {
    pub fn insert(&mut self, args: TemplateArgs, decl: DeclId) -> Option<DeclId> {
        self.by_args.insert(args, decl)
    }

    pub fn remove(&mut self, args: &TemplateArgs) -> Option<DeclId> {
        self.by_args.remove(args)
    }

    pub fn get(&self, args: &TemplateArgs) -> Option<DeclId> {
        self.by_args.get(args).copied()
    }

    pub fn decls(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.by_args.values().copied()
    }

    pub fn len(&self) -> usize {
        self.by_args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_args.is_empty()
    }
}
