use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct RecordingPort {
    mounts: Mutex<Vec<SandboxDocument>>,
    teardowns: Arc<AtomicUsize>,
}

struct RecordingMount {
    location: String,
    teardowns: Arc<AtomicUsize>,
}

#[async_trait]
impl SandboxMount for RecordingMount {
    fn location(&self) -> &str {
        &self.location
    }

    async fn teardown(self: Box<Self>) -> Result<()> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SandboxPort for RecordingPort {
    async fn mount(&self, document: &SandboxDocument) -> Result<Box<dyn SandboxMount>> {
        self.mounts.lock().await.push(document.clone());
        Ok(Box::new(RecordingMount {
            location: format!("memory://preview/{}", document.generation),
            teardowns: Arc::clone(&self.teardowns),
        }))
    }
}

fn markup(text: &str) -> GenerationResult {
    GenerationResult::new(text)
}

#[test]
fn default_policy_only_allows_scripts() {
    assert_eq!(SandboxPolicy::default().sandbox_attribute(), "allow-scripts");

    let locked_down = SandboxPolicy {
        allow_scripts: false,
        ..SandboxPolicy::default()
    };
    assert_eq!(locked_down.sandbox_attribute(), "");
}

#[test]
fn host_page_escapes_markup_into_srcdoc() {
    let document = SandboxDocument {
        generation: 3,
        markup: markup(r#"<div class="a">Tom & 'Jerry'</div><script>top.location='x'</script>"#),
        policy: SandboxPolicy::default(),
    };

    let page = render_host_page(&document);

    assert!(page.contains(r#"sandbox="allow-scripts""#));
    assert!(page.contains(r#"referrerpolicy="no-referrer""#));
    assert!(page.contains(
        "srcdoc=\"&lt;div class=&quot;a&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/div&gt;"
    ));
    assert!(!page.contains("<script>"));
    assert!(!page.contains("allow-same-origin"));
}

#[tokio::test]
async fn absent_result_renders_placeholder_without_mounting() {
    let port = Arc::new(RecordingPort::default());
    let renderer = SandboxedRenderer::new(port.clone());

    assert_eq!(renderer.show(None).await.expect("show"), RenderState::Placeholder);
    assert_eq!(renderer.refresh().await.expect("refresh"), RenderState::Placeholder);

    assert!(port.mounts.lock().await.is_empty());
    assert_eq!(renderer.current().await, RenderState::Placeholder);
}

#[tokio::test]
async fn refresh_tears_down_and_mounts_a_fresh_context() {
    let port = Arc::new(RecordingPort::default());
    let renderer = SandboxedRenderer::new(port.clone());
    let result = markup("<div>spin</div>");

    let first = renderer.show(Some(&result)).await.expect("show");
    let second = renderer.refresh().await.expect("refresh");

    assert_eq!(
        first,
        RenderState::Mounted {
            generation: 1,
            location: "memory://preview/1".into(),
        }
    );
    assert_eq!(
        second,
        RenderState::Mounted {
            generation: 2,
            location: "memory://preview/2".into(),
        }
    );
    assert_eq!(port.teardowns.load(Ordering::SeqCst), 1);

    let mounts = port.mounts.lock().await;
    assert_eq!(mounts.len(), 2);
    assert!(mounts.iter().all(|doc| doc.markup == result));
    assert!(mounts.iter().all(|doc| doc.policy == SandboxPolicy::default()));
}

#[tokio::test]
async fn showing_nothing_tears_down_previous_preview() {
    let port = Arc::new(RecordingPort::default());
    let renderer = SandboxedRenderer::new(port.clone());
    renderer
        .show(Some(&markup("<div></div>")))
        .await
        .expect("show");

    assert_eq!(renderer.show(None).await.expect("show"), RenderState::Placeholder);
    assert_eq!(port.teardowns.load(Ordering::SeqCst), 1);
    assert_eq!(port.mounts.lock().await.len(), 1);
}

#[tokio::test]
async fn iframe_port_writes_and_removes_isolated_pages() {
    let root = tempfile::tempdir().expect("tempdir");
    let renderer = SandboxedRenderer::new(Arc::new(IframeSandboxPort::new(root.path())));
    let result = markup("<canvas id=\"c\"></canvas>");

    let RenderState::Mounted { location: first, .. } =
        renderer.show(Some(&result)).await.expect("show")
    else {
        panic!("expected a mounted preview");
    };
    let page = tokio::fs::read_to_string(&first).await.expect("host page");
    assert!(page.contains("&lt;canvas id=&quot;c&quot;&gt;&lt;/canvas&gt;"));

    let RenderState::Mounted { location: second, .. } =
        renderer.refresh().await.expect("refresh")
    else {
        panic!("expected a mounted preview");
    };
    assert_ne!(first, second);
    assert!(!Path::new(&first).exists(), "stale mount should be removed");
    assert!(Path::new(&second).exists());

    renderer.unmount().await;
    assert!(!Path::new(&second).exists());
    assert_eq!(renderer.current().await, RenderState::Placeholder);
}
