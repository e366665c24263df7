use aws_lambda_events::sqs::{BatchItemFailure, SqsMessage};
use common::{Error, Event};
use lambda_runtime::tracing;
use serde::Deserialize;

/// SNS notification as delivered in the body of an SQS message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEnvelope {
    pub message_id: Option<String>,
    pub topic_arn: Option<String>,
    pub message: String,
}

pub fn decode(body: &str) -> Result<Event, Error> {
    let envelope: SnsEnvelope = serde_json::from_str(body)?;
    Event::from_slice(envelope.message.as_bytes())
}

/// Log every event carried by `messages`; messages that cannot be decoded are
/// returned for redelivery.
pub fn consume(messages: &[SqsMessage]) -> Result<Vec<BatchItemFailure>, Error> {
    let mut failures = Vec::new();

    for message in messages {
        let message_id = message
            .message_id
            .as_ref()
            .ok_or(Error::MissingField("SQS message id"))?;

        let decoded = message
            .body
            .as_deref()
            .ok_or(Error::MissingField("SQS message body"))
            .and_then(decode);

        match decoded {
            Ok(event) => tracing::info!("Received {}: {}", event.event_type, event.message),
            Err(err) => {
                tracing::error!("Failed to decode message {}: {}", message_id, err);
                failures.push(BatchItemFailure {
                    item_identifier: message_id.clone(),
                });
            }
        }
    }

    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_lambda_events::sqs::SqsEvent;
    use serde_json::json;

    fn notification(event: &str) -> String {
        json!({
            "Type": "Notification",
            "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
            "TopicArn": "arn:aws:sns:us-east-1:123456789012:ContentCreated",
            "Message": event,
            "Timestamp": "2024-03-05T14:00:00.000Z",
            "SignatureVersion": "1",
            "Signature": "EXAMPLE",
            "SigningCertURL": "https://sns.us-east-1.amazonaws.com/cert.pem",
            "UnsubscribeURL": "https://sns.us-east-1.amazonaws.com/?Action=Unsubscribe",
        })
        .to_string()
    }

    fn messages(bodies: &[String]) -> Vec<SqsMessage> {
        let records: Vec<_> = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                json!({
                    "messageId": format!("m-{i}"),
                    "receiptHandle": "handle",
                    "body": body,
                    "attributes": {},
                    "messageAttributes": {},
                    "eventSource": "aws:sqs",
                    "eventSourceARN": "arn:aws:sqs:us-east-1:123456789012:fanout",
                    "awsRegion": "us-east-1",
                })
            })
            .collect();
        let event: SqsEvent = serde_json::from_value(json!({ "Records": records })).unwrap();
        event.records
    }

    #[test]
    fn decodes_event_from_envelope() {
        let body = notification(r#"{"Id":"9","EventType":"Create","Message":"hello"}"#);

        let event = decode(&body).unwrap();

        assert_eq!(event.id, "9");
        assert_eq!(event.event_type, "Create");
        assert_eq!(event.message, "hello");
    }

    #[test]
    fn bad_messages_are_returned_for_redelivery() {
        let bodies = vec![
            notification(r#"{"Id":"1","EventType":"Delete","Message":"gone"}"#),
            notification("not an event"),
            "not an envelope".to_string(),
        ];

        let failures = consume(&messages(&bodies)).unwrap();

        let ids: Vec<_> = failures.into_iter().map(|f| f.item_identifier).collect();
        assert_eq!(ids, vec!["m-1", "m-2"]);
    }
}
