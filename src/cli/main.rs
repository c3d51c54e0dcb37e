use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::error::Error;

#[derive(Parser)]
#[command(name = "cms-search-cli")]
#[command(about = "CMS search service CLI", long_about = None, version)]
struct Cli {
    #[arg(short, long, env = "CMS_SEARCH_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a faceted search
    Search {
        /// Free-text query; omit to browse facets only
        query: Option<String>,

        /// Facet selection as `field:value`, repeatable
        #[arg(short, long = "facet")]
        facets: Vec<String>,

        #[arg(short = 'S', long)]
        sort: Option<String>,

        #[arg(long)]
        desc: bool,

        #[arg(short, long, default_value = "1")]
        page: usize,

        #[arg(short = 's', long)]
        page_size: Option<usize>,

        /// Query profile name
        #[arg(short, long)]
        conf: Option<String>,

        #[arg(long)]
        spellcheck: bool,
    },

    /// Start an indexing run
    Index {
        /// Wipe and rebuild the site instead of draining the queue
        #[arg(long)]
        full: bool,
    },

    /// Show the current and last indexing run
    Status,

    /// List configured fields
    Fields,

    /// Queue a content change
    Notify {
        #[arg(value_name = "DOCUMENT_ID")]
        document_id: String,

        /// CREATE, MODIFY or DELETE
        #[arg(short, long, default_value = "MODIFY")]
        task: String,

        #[arg(short, long)]
        resource_type: String,

        /// Restrict to one portlet
        #[arg(short, long)]
        portlet: Option<i32>,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    let response = match cli.command {
        Commands::Search {
            query,
            facets,
            sort,
            desc,
            page,
            page_size,
            conf,
            spellcheck,
        } => {
            client
                .post(format!("{}/v1/search", cli.endpoint))
                .json(&json!({
                    "query": query.unwrap_or_default(),
                    "facets": facets,
                    "sort_field": sort,
                    "sort_order": if desc { "desc" } else { "asc" },
                    "page_index": page,
                    "page_size": page_size,
                    "conf": conf,
                    "spellcheck": spellcheck,
                }))
                .send()
                .await?
        }

        Commands::Index { full } => {
            client
                .post(format!("{}/v1/indexing/run", cli.endpoint))
                .json(&json!({ "full": full }))
                .send()
                .await?
        }

        Commands::Status => {
            client
                .get(format!("{}/v1/indexing/status", cli.endpoint))
                .send()
                .await?
        }

        Commands::Fields => {
            client
                .get(format!("{}/v1/fields", cli.endpoint))
                .send()
                .await?
        }

        Commands::Notify {
            document_id,
            task,
            resource_type,
            portlet,
        } => {
            client
                .post(format!("{}/v1/actions", cli.endpoint))
                .json(&json!({
                    "document_id": document_id,
                    "task": task.to_uppercase(),
                    "resource_type": resource_type,
                    "portlet": portlet.unwrap_or(-1),
                }))
                .send()
                .await?
        }

        Commands::Health => {
            client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?
        }
    };

    print_response(response).await
}

async fn print_response(response: Response) -> Result<(), Box<dyn Error>> {
    let status = response.status();
    let body: Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        return Err(format!("Request failed with status {}", status).into());
    }
    Ok(())
}
