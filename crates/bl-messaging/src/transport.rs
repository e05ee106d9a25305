use std::sync::Arc;

use async_trait::async_trait;
use bl_store::WorkgroupDirectory;
use bl_types::OffchainProcessMessage;
use reqwest::Client;
use uuid::Uuid;

use crate::config::MessagingConfig;
use crate::envelope::OffchainEnvelope;
use crate::error::{MessagingError, MessagingResult};

/// Delivery of offchain process messages to other organizations.
#[async_trait]
pub trait OffchainTransport: Send + Sync {
    async fn send(
        &self,
        message: &OffchainProcessMessage,
        recipient_org_id: Uuid,
        correlation_id: &str,
    ) -> MessagingResult<()>;
}

/// Posts an [`OffchainEnvelope`] to the recipient member's endpoint, looked up
/// in the workgroup named by the message topic.
pub struct HttpTransport {
    client: Client,
    directory: Arc<dyn WorkgroupDirectory>,
}

impl HttpTransport {
    pub fn new(
        config: &MessagingConfig,
        directory: Arc<dyn WorkgroupDirectory>,
    ) -> MessagingResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, directory })
    }
}

#[async_trait]
impl OffchainTransport for HttpTransport {
    async fn send(
        &self,
        message: &OffchainProcessMessage,
        recipient_org_id: Uuid,
        correlation_id: &str,
    ) -> MessagingResult<()> {
        let workgroup_id: Uuid = message
            .topic
            .parse()
            .map_err(|_| MessagingError::InvalidTopic(message.topic.clone()))?;
        let member = self
            .directory
            .find_member(workgroup_id, recipient_org_id)
            .await?
            .ok_or(MessagingError::NoRoute {
                workgroup_id,
                organization_id: recipient_org_id,
            })?;

        let envelope = OffchainEnvelope::new(message.clone(), recipient_org_id, correlation_id);
        let mut request = self
            .client
            .post(&member.organization_endpoint)
            .json(&envelope);
        if !member.organization_token.is_empty() {
            request = request.bearer_auth(&member.organization_token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MessagingError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        tracing::info!(
            message_id = %message.id,
            recipient = %recipient_org_id,
            correlation_id,
            "offchain process message delivered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use bl_store::{DirectoryConfig, StaticWorkgroupDirectory};
    use bl_types::WorkgroupMember;
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    type Inbox = Arc<Mutex<Vec<(Option<String>, OffchainEnvelope)>>>;

    async fn receive(
        State(inbox): State<Inbox>,
        headers: HeaderMap,
        Json(envelope): Json<OffchainEnvelope>,
    ) -> StatusCode {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        inbox.lock().unwrap().push((auth, envelope));
        StatusCode::ACCEPTED
    }

    async fn spawn_org() -> (String, Inbox) {
        let inbox: Inbox = Arc::default();
        let app = Router::new()
            .route("/messages", post(receive))
            .route("/closed", post(|| async { StatusCode::FORBIDDEN }))
            .with_state(inbox.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), inbox)
    }

    fn message(workgroup: Uuid) -> OffchainProcessMessage {
        OffchainProcessMessage {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            topic: workgroup.to_string(),
            workstep_type: "NewVersion".into(),
            referenced_offchain_process_message_id: None,
            baseledger_sync_tree_json: "{}".into(),
            business_object_proof: "ab".repeat(32),
            baseledger_business_object_id: None,
            referenced_baseledger_business_object_id: None,
            status_text_message: String::new(),
            baseledger_transaction_id_of_stored_proof: Uuid::new_v4(),
            tendermint_transaction_id_of_stored_proof: Uuid::new_v4(),
            business_object_type: "PurchaseOrder".into(),
            baseledger_transaction_type: "Suggest".into(),
            referenced_baseledger_transaction_id: None,
            entry_type: "SuggestionSent".into(),
        }
    }

    fn transport(workgroup: Uuid, org: Uuid, endpoint: String) -> HttpTransport {
        let directory = StaticWorkgroupDirectory::new(DirectoryConfig {
            workgroups: vec![],
            members: vec![WorkgroupMember {
                id: Uuid::new_v4(),
                workgroup_id: workgroup,
                organization_id: org,
                organization_endpoint: endpoint,
                organization_token: "org-b-token".into(),
            }],
        });
        HttpTransport::new(&MessagingConfig::default(), Arc::new(directory)).unwrap()
    }

    #[tokio::test]
    async fn delivers_envelope_with_bearer_token() {
        let (base, inbox) = spawn_org().await;
        let (wg, org) = (Uuid::new_v4(), Uuid::new_v4());
        let transport = transport(wg, org, format!("{base}/messages"));
        let msg = message(wg);

        transport.send(&msg, org, "0xhash").await.unwrap();

        let received = inbox.lock().unwrap();
        assert_eq!(received.len(), 1);
        let (auth, envelope) = &received[0];
        assert_eq!(auth.as_deref(), Some("Bearer org-b-token"));
        assert_eq!(envelope.correlation_id, "0xhash");
        assert_eq!(envelope.recipient_org_id, org);
        assert_eq!(envelope.message, msg);
    }

    #[tokio::test]
    async fn unknown_recipient_has_no_route() {
        let (wg, org) = (Uuid::new_v4(), Uuid::new_v4());
        let transport = transport(wg, org, "http://127.0.0.1:1/messages".into());
        let stranger = Uuid::new_v4();
        let err = transport.send(&message(wg), stranger, "h").await.unwrap_err();
        assert_eq!(
            err,
            MessagingError::NoRoute {
                workgroup_id: wg,
                organization_id: stranger
            }
        );
    }

    #[tokio::test]
    async fn non_uuid_topic_is_rejected() {
        let (wg, org) = (Uuid::new_v4(), Uuid::new_v4());
        let transport = transport(wg, org, "http://127.0.0.1:1/messages".into());
        let mut msg = message(wg);
        msg.topic = "purchasing".into();
        assert_eq!(
            transport.send(&msg, org, "h").await.unwrap_err(),
            MessagingError::InvalidTopic("purchasing".into())
        );
    }

    #[tokio::test]
    async fn refused_delivery_reports_status() {
        let (base, _) = spawn_org().await;
        let (wg, org) = (Uuid::new_v4(), Uuid::new_v4());
        let transport = transport(wg, org, format!("{base}/closed"));
        let err = transport.send(&message(wg), org, "h").await.unwrap_err();
        assert!(matches!(err, MessagingError::Rejected { status: 403, .. }));
    }
}
