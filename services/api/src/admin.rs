use crate::infra::build_service;
use clap::Subcommand;
use docdesk::config::AppConfig;
use docdesk::error::AppError;
use docdesk::telemetry;
use docdesk::workflows::document_requests::{DocumentRequest, RequestId};

#[derive(Subcommand, Debug)]
pub(crate) enum RequestsCommand {
    /// List every stored request
    List,
    /// Approve a request and email its document to the requester
    Approve {
        /// Request identifier
        id: i64,
    },
    /// Reject a request without notifying the requester
    Reject {
        /// Request identifier
        id: i64,
    },
}

pub(crate) async fn run_requests_command(command: RequestsCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = build_service(&config).await?;

    match command {
        RequestsCommand::List => {
            let records = service.list().await?;
            print!("{}", render_requests(&records));
        }
        RequestsCommand::Approve { id } => {
            let receipt = service.approve(RequestId(id)).await?;
            println!(
                "Request {} approved; {} sent to {}",
                receipt.request_id,
                receipt.document.display(),
                receipt.recipient
            );
        }
        RequestsCommand::Reject { id } => {
            service.reject(RequestId(id)).await?;
            println!("Request {id} rejected");
        }
    }

    Ok(())
}

fn render_requests(records: &[DocumentRequest]) -> String {
    if records.is_empty() {
        return "No document requests\n".to_string();
    }

    let mut output = String::from("Document requests\n");
    for record in records {
        output.push_str(&format!(
            "- #{} [{}] {} requested '{}'\n",
            record.id, record.status, record.email, record.document_name
        ));
    }
    output
}
