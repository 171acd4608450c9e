//! Find or list records on a layout and print their field data as JSON.
//!
//! Credentials come from `FM_HOST`, `FM_DATABASE` and either `FM_AUTH` or
//! `FM_USERNAME` + `FM_PASSWORD`. The session is cached under
//! `~/.fmdata/sessions/` so repeated runs reuse one token.
//!
//! ```sh
//! cargo run --bin fm-find -- Bands                          # first 100 records
//! cargo run --bin fm-find -- Bands city=Nashville genre=Rock
//! ```

use fmdata::{FindRequest, RecordsClient};
use serde_json::Value;

const LIST_LIMIT: u32 = 100;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let layout = args.next().unwrap_or_else(|| usage());

    let mut request = FindRequest::new();
    for arg in args {
        match arg.split_once('=') {
            Some((field, value)) => request = request.and_field(field, value),
            None => usage(),
        }
    }

    let client = RecordsClient::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let result = if request.is_empty() {
        client.get_records(&layout, 1, LIST_LIMIT).await
    } else {
        client.find(&layout, &request).await
    };

    let rows: Vec<Value> = match result {
        Ok(found) => found
            .into_iter()
            .map(|record| Value::Object(record.field_data))
            .collect(),
        Err(e) if e.is_no_records_match() => Vec::new(),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&rows) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn usage() -> ! {
    eprintln!("usage: fm-find <layout> [field=value ...]");
    std::process::exit(2);
}
