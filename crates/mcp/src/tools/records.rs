use resin_core::errors::{validate_identifier, ValidationError};
use resin_core::executor::Fields;
use resin_core::session::Session;
use serde_json::Value;
use tracing::info;

use super::validation_block;
use crate::format::header;

pub async fn create_record(session: &Session, sobject: &str, fields: &Value) -> String {
    let sobject = sobject.trim();
    let Some(fields) = non_empty_object(fields).filter(|_| !sobject.is_empty()) else {
        return validation_block(&ValidationError::CreateRecord);
    };
    if let Err(error) = validate_identifier("sobject", sobject) {
        return validation_block(&error);
    }

    match session.create(sobject, fields).await {
        Ok(created) => {
            info!(
                event_name = "tool.create_record.completed",
                correlation_id = session.correlation_id(),
                sobject,
                "record created"
            );
            format!(
                "{}\n- sObject: {sobject}\n- Id: {}\n- Fields: {}",
                header("Record Created"),
                created.id,
                Value::Object(fields.clone())
            )
        }
        Err(error) => {
            format!("{}\n- Unable to create {sobject}. {error}", header("Salesforce Error"))
        }
    }
}

/// Partial update: only the given fields change.
pub async fn update_record(
    session: &Session,
    sobject: &str,
    record_id: &str,
    fields: &Value,
) -> String {
    let (sobject, record_id) = (sobject.trim(), record_id.trim());
    let Some(fields) =
        non_empty_object(fields).filter(|_| !sobject.is_empty() && !record_id.is_empty())
    else {
        return validation_block(&ValidationError::UpdateRecord);
    };
    let identifiers = validate_identifier("sobject", sobject)
        .and_then(|()| validate_identifier("record_id", record_id));
    if let Err(error) = identifiers {
        return validation_block(&error);
    }

    match session.update(sobject, record_id, fields).await {
        Ok(()) => {
            info!(
                event_name = "tool.update_record.completed",
                correlation_id = session.correlation_id(),
                sobject,
                "record updated"
            );
            format!(
                "{}\n- sObject: {sobject}\n- Id: {record_id}\n- Fields: {}",
                header("Record Updated"),
                Value::Object(fields.clone())
            )
        }
        Err(error) => format!(
            "{}\n- Unable to update {sobject} {record_id}. {error}",
            header("Salesforce Error")
        ),
    }
}

fn non_empty_object(value: &Value) -> Option<&Fields> {
    value.as_object().filter(|fields| !fields.is_empty())
}
