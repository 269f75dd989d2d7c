use criterion::{black_box, criterion_group, criterion_main, Criterion};
use openai_api::latest_reply;
use openai_api::models::{ListResponse, ThreadMessage};
use serde_json::json;

// $ cargo bench -p openai_api
//
// Extracting the reply is done once per request, on a list of at most 20 messages
// (the API page size). This only guards against something silly like cloning the list.

fn message(i: usize) -> ThreadMessage {
    serde_json::from_value(json!({
        "id": format!("msg_{}", i),
        "role": if i % 2 == 0 { "assistant" } else { "user" },
        "content": [
            { "type": "image_file", "image_file": { "file_id": "file_1" } },
            { "type": "text", "text": { "value": "Lorem ipsum ".repeat(200), "annotations": [] } }
        ]
    }))
    .unwrap()
}

fn bench_latest_reply(c: &mut Criterion) {
    let page = ListResponse {
        data: (0..20).map(message).collect::<Vec<_>>(),
    };

    c.bench_function("latest reply from full page", |b| {
        b.iter(|| latest_reply(black_box(&page)).map(str::len))
    });

    let empty: ListResponse<ThreadMessage> = ListResponse { data: vec![] };
    c.bench_function("latest reply from empty page", |b| {
        b.iter(|| latest_reply(black_box(&empty)).is_err())
    });
}

criterion_group!(benches, bench_latest_reply);
criterion_main!(benches);
