use quill_lang_ast::{DeclKind, Ident, InMemorySource, Loc, VarData};
use quill_lang_backend::{Reference, SymbolKind};
use quill_lang_driver::{CommitMode, DriverError, Error, Session, TransactionState};
use url::Url;

fn name(s: &str) -> Ident {
    Ident::from_string(s)
}

fn session_with_input(content: &str) -> (Session, Url) {
    let mut source = InMemorySource::new();
    let uri = Url::parse("repl://input/1").unwrap();
    source.insert(uri.clone(), content.to_owned());
    (Session::from_source(source), uri)
}

/// Committing with code generation emits the initialization scaffolding
/// for globals with dynamic initializers, and reverting removes the
/// scaffolding together with the global.
#[test]
fn global_initializers_are_emitted_and_removed() {
    let (mut sess, uri) = session_with_input("int g = answer();");
    let mut txn = sess.begin_transaction();
    let file = sess.intern_source(&uri).unwrap();
    let root = sess.graph.root;

    let g = sess.graph.declare(
        root,
        Some(name("g")),
        Loc::new(file, 4),
        DeclKind::Var(VarData { has_initializer: true, ..Default::default() }),
    );
    txn.record_top_level(vec![g]);
    sess.commit_transaction(&mut txn, CommitMode::Codegen).unwrap();

    assert_eq!(sess.module.names(), vec!["__tu_init.0", "__var_init.g", "g"]);
    let init = sess.module.get("__tu_init.0").unwrap();
    assert!(init.internal);
    assert_eq!(init.refs, vec![Reference::Symbol("__var_init.g".to_owned())]);

    assert!(sess.revert_transaction(&mut txn));
    assert_eq!(txn.state(), TransactionState::RolledBack);
    assert!(sess.module.is_empty());
    assert!(sess.engine.is_empty());
}

/// Remaining references to a removed symbol are replaced with an inert
/// placeholder instead of dangling.
#[test]
fn lingering_references_are_replaced_with_placeholders() {
    let (mut sess, uri) = session_with_input("int shared; int user = shared;");
    let mut txn = sess.begin_transaction();
    let file = sess.intern_source(&uri).unwrap();
    let root = sess.graph.root;

    let shared = sess.graph.declare(
        root,
        Some(name("shared")),
        Loc::new(file, 4),
        DeclKind::Var(VarData::default()),
    );
    txn.record_top_level(vec![shared]);
    sess.commit_transaction(&mut txn, CommitMode::Codegen).unwrap();

    // a symbol from an earlier transaction still refers to `shared`
    sess.module.define_function("use_shared", false, vec!["shared".to_owned()]).unwrap();

    assert!(sess.revert_transaction(&mut txn));
    assert!(!sess.module.contains("shared"));
    assert_eq!(
        sess.module.get("use_shared").unwrap().refs,
        vec![Reference::Placeholder(SymbolKind::Global)]
    );
}

/// A transaction can only be committed while it is still collecting.
#[test]
fn committing_twice_is_an_error() {
    let (mut sess, _uri) = session_with_input("");
    let mut txn = sess.begin_transaction();
    sess.commit_transaction(&mut txn, CommitMode::ParseOnly).unwrap();
    assert!(matches!(
        sess.commit_transaction(&mut txn, CommitMode::ParseOnly),
        Err(Error::Driver(DriverError::NotCollecting))
    ));
}

/// Parameters and variables in templated contexts produce no symbols.
#[test]
fn codegen_skips_parameters_and_templated_contexts() {
    let (mut sess, uri) = session_with_input("template<typename T> T t;");
    let mut txn = sess.begin_transaction();
    let file = sess.intern_source(&uri).unwrap();
    let root = sess.graph.root;

    let dependent = sess.graph.declare(
        root,
        Some(name("t")),
        Loc::new(file, 21),
        DeclKind::Var(VarData { in_templated_context: true, ..Default::default() }),
    );
    txn.record_top_level(vec![dependent]);
    sess.commit_transaction(&mut txn, CommitMode::Codegen).unwrap();

    assert!(sess.module.is_empty());
    assert!(sess.revert_transaction(&mut txn));
}
