//! Strategy ordering and linked-file handling in the extraction cascade.

mod common;

use base64::Engine;
use common::{FakeTransport, FakeRefiner};
use quizchain::extract::PageContext;
use quizchain::{resolve_submit_url, Answer, Cascade, Snapshot, StrategyKind};
use std::sync::Arc;

const TABLE: &str = "<table><tr><th>id</th><th>value</th></tr>\
    <tr><td>1</td><td>10</td></tr><tr><td>2</td><td>20</td></tr></table>";

fn b64(s: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(s)
}

fn page(url: &str, markup: &str, text: &str) -> PageContext {
    PageContext::new(url, Snapshot::new(markup, text))
}

async fn run(transport: FakeTransport, page: &PageContext) -> (Answer, StrategyKind) {
    let extraction = Cascade::new(Arc::new(transport)).run(page).await;
    (extraction.answer, extraction.strategy)
}

#[tokio::test]
async fn test_table_wins_without_payload() {
    let p = page("https://q.example/1", TABLE, "answer is 99. Rows: 1 10 2 20");
    assert_eq!(
        run(FakeTransport::new(), &p).await,
        (Answer::Float(30.0), StrategyKind::TableAggregate)
    );
}

#[tokio::test]
async fn test_payload_answer_beats_table() {
    let markup = format!("{TABLE}<script>q.innerHTML = atob(`{}`)</script>", b64("the answer is 12"));
    let p = page("https://q.example/1", &markup, "id value");
    assert_eq!(
        run(FakeTransport::new(), &p).await,
        (Answer::Int(12), StrategyKind::EncodedPayload)
    );
}

#[tokio::test]
async fn test_payload_without_answer_defers_to_table() {
    let markup = format!(
        "{TABLE}<script>q.innerHTML = atob(`{}`)</script>",
        b64("visit https://host.example/x/submit now")
    );
    let p = page("https://host.example/page", &markup, "id value");
    assert_eq!(
        run(FakeTransport::new(), &p).await,
        (Answer::Float(30.0), StrategyKind::TableAggregate)
    );
    assert_eq!(
        resolve_submit_url(&p.snapshot, &p.url).as_deref(),
        Some("https://host.example/x/submit")
    );
}

#[tokio::test]
async fn test_operation_keyword_from_visible_text() {
    let p = page("https://q.example/1", TABLE, "What is the average value?");
    assert_eq!(run(FakeTransport::new(), &p).await.0, Answer::Float(15.0));
    let p = page("https://q.example/1", TABLE, "Count the entries");
    assert_eq!(run(FakeTransport::new(), &p).await.0, Answer::Int(2));
}

#[tokio::test]
async fn test_linked_csv_is_aggregated() {
    let markup = r#"<p>Download <a href="/files/data.csv">the data</a> and give the maximum.</p>"#;
    let transport = FakeTransport::new().file(
        "https://q.example/files/data.csv",
        b"name,amount\na,4\nb,11\nc,7\n",
        Some("text/csv"),
    );
    let p = page(
        "https://q.example/quiz",
        markup,
        "Download the data and give the maximum.",
    );
    assert_eq!(
        run(transport, &p).await,
        (Answer::Float(11.0), StrategyKind::LinkedFile)
    );
}

#[tokio::test]
async fn test_linked_file_from_decoded_payload() {
    let markup = format!("<div id=q></div><script>q.innerHTML = atob('{}')</script>", b64(
        "Sum the value column of https://cdn.example/d.csv"
    ));
    let transport = FakeTransport::new().file(
        "https://cdn.example/d.csv",
        b"id,value\n1,1.5\n2,2.5\n",
        None,
    );
    let p = page("https://q.example/quiz", &markup, "");
    assert_eq!(
        run(transport, &p).await,
        (Answer::Float(4.0), StrategyKind::LinkedFile)
    );
}

#[tokio::test]
async fn test_linked_image_becomes_data_uri() {
    let markup = r#"<img src="https://q.example/chart.png">"#;
    let transport =
        FakeTransport::new().file("https://q.example/chart.png", &[0x89, b'P', b'N', b'G'], Some("image/png"));
    let p = page("https://q.example/quiz", markup, "Submit the chart");
    let (answer, strategy) = run(transport, &p).await;
    assert_eq!(strategy, StrategyKind::LinkedFile);
    assert_eq!(answer, Answer::Text("data:image/png;base64,iVBORw==".into()));
}

#[tokio::test]
async fn test_failed_download_falls_through() {
    let markup = r#"<a href="https://q.example/missing.csv">data</a>"#;
    let p = page("https://q.example/quiz", markup, "the answer is true");
    assert_eq!(
        run(FakeTransport::new(), &p).await,
        (Answer::Bool(true), StrategyKind::AnswerLiteral)
    );
}

#[tokio::test]
async fn test_bare_number_fallback() {
    let p = page("https://q.example/1", "<p>x</p>", "Enter 5 plus 6");
    assert_eq!(
        run(FakeTransport::new(), &p).await,
        (Answer::Int(11), StrategyKind::BareNumber)
    );
}

#[tokio::test]
async fn test_refiner_text_is_used_verbatim() {
    let p = page("https://q.example/1", "", "How many moons? maybe 2");
    let cascade = Cascade::new(Arc::new(FakeTransport::new()))
        .with_refiner(Arc::new(FakeRefiner::ok(" Two ")));
    let extraction = cascade.run(&p).await;
    assert_eq!(extraction.answer, Answer::Text(" Two ".into()));
    assert_eq!(extraction.strategy, StrategyKind::ExternalRefiner);
}

#[tokio::test]
async fn test_hostile_markup_never_panics() {
    let junk = [
        "<table><tr><th>value</th></tr><tr><td>NaN</td></tr></table>",
        "atob(`====`) <table><table><tr>",
        "<a href=\"http://[::1:bad/x.csv\">x</a>",
        "\u{0}\u{1}\u{fffd}<<>>",
    ];
    for markup in junk {
        let p = page("https://q.example/1", markup, "");
        let (answer, _) = run(FakeTransport::new(), &p).await;
        assert_eq!(answer, Answer::Bool(true), "markup: {markup}");
    }
}
