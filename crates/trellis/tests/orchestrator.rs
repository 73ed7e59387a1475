//! Integration tests for widget discovery, initialization and teardown.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use trellis::{
    Document, Element, FnResolver, InitError, LifecycleState, ModuleRegistry, Orchestrator,
    OrchestratorConfig, ResolveError, Signal, StateClass, TeardownError, TreeError, Widget,
    WidgetBase, WidgetError, WidgetModule, WidgetResult,
};

type Log = Arc<Mutex<Vec<String>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How a [`Probe`] misbehaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Fault {
    #[default]
    None,
    PreInit,
    PreInitFlagged,
    PostInit,
    PostInitFlagged,
    DestroyedDuringInit,
    Destroy,
    DestroyThenError,
}

/// A widget that records every lifecycle call into a shared log.
struct Probe {
    base: WidgetBase,
    name: String,
    fault: Fault,
    log: Log,
}

impl Probe {
    fn record(&self, event: &str) {
        self.log.lock().push(format!("{event}:{}", self.name));
    }
}

#[async_trait]
impl Widget for Probe {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn widget_base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    async fn pre_init(&mut self, target: &Element) -> WidgetResult<()> {
        self.record("pre");
        match self.fault {
            Fault::PreInit => Err(WidgetError::failed("pre boom")),
            Fault::PreInitFlagged => {
                self.base.pre_init(target)?;
                self.fail(&WidgetError::failed("flagged"));
                Ok(())
            }
            _ => self.base.pre_init(target),
        }
    }

    async fn post_init(&mut self, _target: &Element) -> WidgetResult<()> {
        self.record("post");
        match self.fault {
            Fault::PostInit => Err(WidgetError::failed("post boom")),
            Fault::PostInitFlagged => {
                self.fail(&WidgetError::failed("flagged"));
                Ok(())
            }
            _ => self.base.post_init(),
        }
    }

    fn destroy(&mut self) -> WidgetResult<()> {
        self.record("destroy");
        match self.fault {
            Fault::DestroyedDuringInit => {
                let target = self.base.target().cloned();
                self.base.destroy();
                match target {
                    Some(node) => Err(WidgetError::destroyed_during_init(&node, format!("widgets/{}", self.name))),
                    None => Ok(()),
                }
            }
            Fault::Destroy => Err(WidgetError::failed("stuck")),
            Fault::DestroyThenError => {
                self.base.destroy();
                Err(WidgetError::failed("stuck"))
            }
            _ => {
                self.base.destroy();
                Ok(())
            }
        }
    }
}

fn probe_module(name: &'static str, fault: Fault, log: &Log) -> WidgetModule {
    let log = log.clone();
    WidgetModule::new().with_export(format!("Widget{}", name.to_uppercase()), move || {
        Box::new(Probe {
            base: WidgetBase::new(),
            name: name.to_string(),
            fault,
            log: log.clone(),
        })
    })
}

fn probe_registry(log: &Log, faults: &[(&'static str, Fault)]) -> ModuleRegistry {
    let faults: HashMap<_, _> = faults.iter().copied().collect();
    ["a", "b", "c"].into_iter().fold(ModuleRegistry::new(), |registry, name| {
        let fault = faults.get(name).copied().unwrap_or_default();
        registry.with_module(format!("widgets/{name}"), probe_module(name, fault, log))
    })
}

/// ```text
/// <div id="root" class="tree">
///   <div widget="widgets/a">
///     <div widget="widgets/b"></div>
///   </div>
///   <div widget="widgets/c"></div>
/// </div>
/// ```
struct Page {
    _doc: Document,
    root: Element,
    a: Element,
    b: Element,
    c: Element,
}

impl Page {
    fn new() -> Self {
        Self::with_attribute("widget")
    }

    fn with_attribute(attribute: &str) -> Self {
        let doc = Document::new();
        let root = doc.body().append_element("div").unwrap();
        root.set_attribute("id", "root").unwrap();
        root.add_class("tree").unwrap();

        let a = root.append_element("div").unwrap();
        a.set_attribute(attribute, "widgets/a").unwrap();
        let b = a.append_element("div").unwrap();
        b.set_attribute(attribute, "widgets/b").unwrap();
        let c = root.append_element("div").unwrap();
        c.set_attribute(attribute, "widgets/c").unwrap();

        Self { _doc: doc, root, a, b, c }
    }

    fn nodes(&self) -> [&Element; 3] {
        [&self.a, &self.b, &self.c]
    }
}

fn probe_orchestrator(log: &Log, faults: &[(&'static str, Fault)]) -> Orchestrator {
    Orchestrator::builder()
        .resolver(probe_registry(log, faults))
        .build()
}

/// Run `initialize` and return what the callback received.
async fn initialize(orchestrator: &mut Orchestrator, root: &Element) -> Option<Vec<InitError>> {
    let mut calls = 0;
    let mut received = None;
    orchestrator
        .initialize(root, |errors| {
            calls += 1;
            received = errors;
        })
        .await;
    assert_eq!(calls, 1, "completion callback must run exactly once");
    received
}

fn events(log: &Log, prefix: &str) -> Vec<String> {
    log.lock()
        .iter()
        .filter(|event| event.starts_with(prefix))
        .cloned()
        .collect()
}

fn feedback_lines(info: &Element) -> Vec<String> {
    info.children()
        .unwrap()
        .iter()
        .map(|p| p.text_content().unwrap())
        .collect()
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn test_initializes_all_widgets() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[]);

    assert!(initialize(&mut orchestrator, &page.root).await.is_none());

    assert_eq!(orchestrator.len(), 3);
    assert_eq!(
        *log.lock(),
        vec!["pre:a", "pre:b", "pre:c", "post:a", "post:b", "post:c"]
    );
    for node in page.nodes() {
        assert!(orchestrator.contains(node));
        assert!(node.has_state(StateClass::Initialized));
        assert!(!node.has_state(StateClass::PreInitialized));
        assert_eq!(
            orchestrator.widget(node).unwrap().lifecycle_state(),
            LifecycleState::Initialized
        );
    }
}

#[tokio::test]
async fn test_builtin_widgets() {
    init_tracing();
    let page = Page::new();
    let mut orchestrator = Orchestrator::new();

    assert!(initialize(&mut orchestrator, &page.root).await.is_none());
    assert_eq!(orchestrator.len(), 3);

    orchestrator.teardown(&page.root).unwrap();
    assert!(orchestrator.is_empty());
    for node in page.nodes() {
        for state in StateClass::ALL {
            assert!(!node.has_state(state));
        }
    }
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[]);

    assert!(initialize(&mut orchestrator, &page.root).await.is_none());
    assert!(initialize(&mut orchestrator, &page.root).await.is_none());

    assert_eq!(orchestrator.len(), 3);
    assert_eq!(events(&log, "pre:").len(), 3);
    assert_eq!(events(&log, "post:").len(), 3);
}

#[tokio::test]
async fn test_post_init_only_for_new_nodes() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[]);
    initialize(&mut orchestrator, &page.root).await;

    let late = page.c.append_element("div").unwrap();
    late.set_attribute("widget", "widgets/a").unwrap();
    log.lock().clear();

    assert!(initialize(&mut orchestrator, &page.root).await.is_none());
    assert_eq!(*log.lock(), vec!["pre:a", "post:a"]);
    assert_eq!(orchestrator.len(), 4);
    assert!(late.has_state(StateClass::Initialized));
}

#[tokio::test]
async fn test_resolver_failure_is_isolated() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = Orchestrator::builder()
        .resolver(FnResolver::new(move |path: &str| match path {
            "widgets/b" => Err(ResolveError::load(path, "Failed to load widget B")),
            "widgets/a" => Ok(probe_module("a", Fault::None, &log)),
            _ => Ok(probe_module("c", Fault::None, &log)),
        }))
        .build();

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Failed to load widget B"));
    assert_eq!(errors[0].path(), Some("widgets/b"));
    assert_eq!(orchestrator.len(), 2);
    assert!(!orchestrator.contains(&page.b));
    assert!(page.b.has_state(StateClass::Failed));

    orchestrator.teardown(&page.root).unwrap();
    assert!(orchestrator.is_empty());
}

#[tokio::test]
async fn test_class_not_found() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let registry = probe_registry(&log, &[]).with_module("widgets/a", WidgetModule::new());
    let mut orchestrator = Orchestrator::builder().resolver(registry).build();

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "Error in widgets/a: Widget class WidgetA not found in widgets/a"
    );
    assert!(page.a.has_state(StateClass::Failed));
    assert_eq!(orchestrator.len(), 2);
}

#[tokio::test]
async fn test_missing_module() {
    init_tracing();
    let page = Page::new();
    let mut orchestrator = Orchestrator::builder()
        .resolver(ModuleRegistry::new())
        .build();

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();

    assert_eq!(errors.len(), 3);
    let paths: Vec<_> = errors.iter().map(|e| e.path().unwrap()).collect();
    assert_eq!(paths, vec!["widgets/a", "widgets/b", "widgets/c"]);
    assert!(orchestrator.is_empty());
}

#[tokio::test]
async fn test_pre_init_error_skips_registration() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[("b", Fault::PreInit)]);

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "Error in widgets/b: pre boom");
    assert!(!orchestrator.contains(&page.b));
    assert!(page.b.has_state(StateClass::Failed));
    assert!(events(&log, "post:b").is_empty());
    assert_eq!(orchestrator.len(), 2);
}

#[tokio::test]
async fn test_pre_init_self_reported_failure() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[("b", Fault::PreInitFlagged)]);

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();

    assert_eq!(
        errors,
        vec![InitError::PreInitFailed { path: "widgets/b".into() }]
    );
    assert_eq!(
        errors[0].to_string(),
        "Widget widgets/b failed during pre-initialization."
    );
    assert!(!orchestrator.contains(&page.b));
    assert!(page.b.has_state(StateClass::Failed));
    assert!(events(&log, "post:b").is_empty());
}

#[tokio::test]
async fn test_post_init_error_keeps_registration() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[("c", Fault::PostInit)]);

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_post_init());
    assert_eq!(
        errors[0].to_string(),
        "Error in widgets/c during post-init: post boom"
    );
    assert!(orchestrator.contains(&page.c));
    assert!(page.c.has_state(StateClass::Failed));
    assert!(!page.c.has_state(StateClass::Initialized));

    // Still destroyable.
    orchestrator.teardown(&page.root).unwrap();
    assert_eq!(events(&log, "destroy:c").len(), 1);
    assert!(orchestrator.is_empty());
}

#[tokio::test]
async fn test_post_init_self_reported_failure() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[("a", Fault::PostInitFlagged)]);

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();

    assert_eq!(
        errors,
        vec![InitError::PostInitFailed { path: "widgets/a".into() }]
    );
    assert!(orchestrator.contains(&page.a));
    assert!(page.a.has_state(StateClass::Failed));
    assert!(!page.a.has_state(StateClass::Initialized));
}

#[tokio::test]
async fn test_pre_init_errors_precede_post_init_errors() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator =
        probe_orchestrator(&log, &[("a", Fault::PostInit), ("c", Fault::PreInit)]);

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();

    let paths: Vec<_> = errors.iter().map(|e| e.path().unwrap()).collect();
    assert_eq!(paths, vec!["widgets/c", "widgets/a"]);
    assert!(!errors[0].is_post_init());
    assert!(errors[1].is_post_init());
}

#[tokio::test]
async fn test_query_failure_reported_once() {
    init_tracing();
    let page = Page::new();
    page.root.remove().unwrap();
    let mut orchestrator = Orchestrator::new();

    let errors = initialize(&mut orchestrator, &page.root).await.unwrap();
    assert_eq!(errors, vec![InitError::Query(TreeError::InvalidNodeId)]);
}

#[tokio::test]
async fn test_custom_attribute_and_prefix() {
    init_tracing();
    let page = Page::with_attribute("data-widget");
    let log = Log::default();
    let registry = ["a", "b", "c"].into_iter().fold(ModuleRegistry::new(), |registry, name| {
        let log = log.clone();
        registry.with_module(
            format!("widgets/{name}"),
            WidgetModule::new().with_export(format!("Ui{}", name.to_uppercase()), move || {
                Box::new(Probe {
                    base: WidgetBase::new(),
                    name: name.to_string(),
                    fault: Fault::None,
                    log: log.clone(),
                })
            }),
        )
    });
    let mut orchestrator = Orchestrator::builder()
        .config(
            OrchestratorConfig::default()
                .with_widget_attribute("data-widget")
                .with_export_prefix("Ui"),
        )
        .resolver(registry)
        .build();

    assert!(initialize(&mut orchestrator, &page.root).await.is_none());
    assert_eq!(orchestrator.len(), 3);
}

// =============================================================================
// Teardown
// =============================================================================

#[tokio::test]
async fn test_teardown_in_reverse_document_order() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[]);
    initialize(&mut orchestrator, &page.root).await;

    orchestrator.teardown(&page.root).unwrap();

    assert_eq!(
        events(&log, "destroy:"),
        vec!["destroy:c", "destroy:b", "destroy:a"]
    );
    assert!(orchestrator.is_empty());
    for node in page.nodes() {
        assert!(!node.has_state(StateClass::Initialized));
    }
}

#[tokio::test]
async fn test_teardown_with_nothing_registered() {
    init_tracing();
    let page = Page::new();
    let mut orchestrator = Orchestrator::new();

    assert_eq!(orchestrator.teardown(&page.root), Ok(()));
    assert!(orchestrator.is_empty());
}

#[tokio::test]
async fn test_teardown_twice_destroys_once() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[]);
    initialize(&mut orchestrator, &page.root).await;

    orchestrator.teardown(&page.root).unwrap();
    orchestrator.teardown(&page.root).unwrap();

    assert_eq!(events(&log, "destroy:").len(), 3);
}

#[tokio::test]
async fn test_teardown_tolerates_destroyed_during_init() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let sink = Signal::<String>::new();
    let lines = Log::default();
    let lines_clone = lines.clone();
    sink.connect(move |line| lines_clone.lock().push(line.clone()));

    let mut orchestrator = Orchestrator::builder()
        .resolver(probe_registry(&log, &[("a", Fault::DestroyedDuringInit)]))
        .feedback(sink)
        .build();
    initialize(&mut orchestrator, &page.root).await;

    assert_eq!(orchestrator.teardown(&page.root), Ok(()));

    assert!(orchestrator.is_empty());
    assert_eq!(
        *lines.lock(),
        vec![
            "Widget widgets/c destroyed.",
            "Widget widgets/b destroyed.",
            "Widget div (Path: widgets/a) was destroyed during initialization.",
        ]
    );
}

#[tokio::test]
async fn test_unknown_destroy_error_aborts_teardown() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[("b", Fault::Destroy)]);
    initialize(&mut orchestrator, &page.root).await;

    let err = orchestrator.teardown(&page.root).unwrap_err();

    assert_eq!(
        err,
        TeardownError::Destroy {
            path: "widgets/b".into(),
            source: WidgetError::failed("stuck"),
        }
    );
    assert_eq!(events(&log, "destroy:"), vec!["destroy:c", "destroy:b"]);
    assert!(!orchestrator.contains(&page.c));
    assert!(orchestrator.contains(&page.b));
    assert!(orchestrator.contains(&page.a));
}

#[tokio::test]
async fn test_teardown_drops_self_destroyed_leftovers() {
    init_tracing();
    let page = Page::new();
    let log = Log::default();
    let mut orchestrator = probe_orchestrator(&log, &[("b", Fault::DestroyThenError)]);
    initialize(&mut orchestrator, &page.root).await;

    assert!(orchestrator.teardown(&page.root).is_err());
    assert!(orchestrator.contains(&page.b));
    assert!(orchestrator.widget(&page.b).unwrap().is_destroyed());

    assert_eq!(orchestrator.teardown(&page.root), Ok(()));
    assert!(orchestrator.is_empty());
    assert_eq!(events(&log, "destroy:"), vec!["destroy:c", "destroy:b", "destroy:a"]);
}

// =============================================================================
// Feedback
// =============================================================================

#[tokio::test]
async fn test_feedback_written_to_info_block() {
    init_tracing();
    let page = Page::new();
    let info = page.root.document().body().append_element("div").unwrap();
    let log = Log::default();
    let mut orchestrator = Orchestrator::builder()
        .resolver(probe_registry(&log, &[("b", Fault::PreInit)]))
        .feedback(info.clone())
        .build();

    initialize(&mut orchestrator, &page.root).await;
    orchestrator.teardown(&page.root).unwrap();

    assert_eq!(
        feedback_lines(&info),
        vec![
            "Error in widgets/b: pre boom",
            "Widget widgets/c destroyed.",
            "Widget widgets/a destroyed.",
        ]
    );
}

#[tokio::test]
async fn test_destroy_reports_can_be_disabled() {
    init_tracing();
    let page = Page::new();
    let info = page.root.document().body().append_element("div").unwrap();
    let log = Log::default();
    let mut orchestrator = Orchestrator::builder()
        .config(OrchestratorConfig::default().with_report_destroyed(false))
        .resolver(probe_registry(&log, &[]))
        .feedback(info.clone())
        .build();

    initialize(&mut orchestrator, &page.root).await;
    orchestrator.teardown(&page.root).unwrap();

    assert!(feedback_lines(&info).is_empty());
    assert!(orchestrator.is_empty());
}
