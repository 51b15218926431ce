//! Moneris gateway client.

use std::time::Instant;

use tracing::instrument;
use uuid::Uuid;

use super::{Operation, PaymentGateway, builder, normalize::normalize_response};
use crate::{
    audit,
    config::{EnvLookup, GatewayConfig, ProcessEnv},
    error::{GatewayError, Result},
    history::{HostTransaction, RefundTarget, TransactionRecord},
    models::{Amount, PaymentForm, PaymentInstrument, TransactionRequest, TransactionResult},
    security::audit::{AuditEvent, AuditEventType, audit_log},
    transport::{HttpTransport, ProcessorRequest, SubmitTarget, Transport, TxnType},
};

/// Audit context of one operation call.
struct Submission<'a> {
    operation: Operation,
    order_id: &'a str,
    amount: Amount,
    card: Option<String>,
}

/// Moneris card gateway.
///
/// Holds read-only configuration, a transport and an environment source.
/// Credentials are resolved from them on every call, so the gateway can be
/// shared across tasks and picks up rotated environment variables.
///
/// # Examples
///
/// ```rust,no_run
/// use moneris_gateway::{
///     config::GatewayConfig,
///     gateway::{MonerisGateway, PaymentGateway},
///     models::Amount,
/// };
///
/// # async fn example() -> moneris_gateway::error::Result<()> {
/// let config = GatewayConfig::from_toml(r#"
///     environment = "staging"
///     store_id = "$MONERIS_STORE_ID"
///     api_token = "$MONERIS_API_TOKEN"
/// "#)?;
/// let gateway = MonerisGateway::new(config)?;
///
/// let result = gateway
///     .capture("660110910011139740", Amount::from_minor_units(2599)?, "ORD-1001")
///     .await?;
/// println!("{}: {}", result.code(), result.message());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MonerisGateway<T = HttpTransport, E = ProcessEnv> {
    config: GatewayConfig,
    transport: T,
    env: E,
}

impl MonerisGateway {
    /// Creates a gateway that talks HTTPS, reading credentials from the
    /// process environment when configured to.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationError`] if the configuration is
    /// invalid, or an error if the HTTP client cannot be created.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_config(&config.http)?;
        Ok(Self { config, transport, env: ProcessEnv })
    }
}

impl<T: Transport> MonerisGateway<T> {
    /// Creates a gateway over a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationError`] if the configuration is invalid.
    pub fn with_transport(config: GatewayConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, transport, env: ProcessEnv })
    }
}

impl<T: Transport, E: EnvLookup> MonerisGateway<T, E> {
    /// Replaces the environment source used for credential resolution.
    #[must_use]
    pub fn with_env<E2: EnvLookup>(self, env: E2) -> MonerisGateway<T, E2> {
        MonerisGateway { config: self.config, transport: self.transport, env }
    }

    /// Gateway configuration.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// True when running against the QA environment.
    #[must_use]
    pub const fn is_test_mode(&self) -> bool {
        self.config.is_test_mode()
    }

    /// Authorizes a host transaction with card data from a payment form.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] if the form or order is invalid,
    /// and otherwise as [`PaymentGateway::authorize`].
    pub async fn authorize_transaction(
        &self,
        transaction: &HostTransaction,
        form: PaymentForm,
    ) -> Result<TransactionResult> {
        let instrument = form.validate()?;
        let request = transaction.to_request()?;
        self.authorize(&request, instrument).await
    }

    /// Purchases a host transaction with card data from a payment form.
    ///
    /// # Errors
    ///
    /// As [`Self::authorize_transaction`].
    pub async fn purchase_transaction(
        &self,
        transaction: &HostTransaction,
        form: PaymentForm,
    ) -> Result<TransactionResult> {
        let instrument = form.validate()?;
        let request = transaction.to_request()?;
        self.purchase(&request, instrument).await
    }

    /// Captures a host transaction against the authorization `reference`.
    ///
    /// # Errors
    ///
    /// As [`PaymentGateway::capture`].
    pub async fn capture_transaction(
        &self,
        transaction: &HostTransaction,
        reference: &str,
    ) -> Result<TransactionResult> {
        self.capture(reference, transaction.payment_amount, &transaction.order_number).await
    }

    /// Refunds a host transaction, locating what it reverses first.
    ///
    /// See [`RefundTarget::resolve`] for the lookup rules.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingReference`] before any I/O if no
    /// successful purchase or capture is found, and otherwise as
    /// [`PaymentGateway::refund`].
    pub async fn refund_transaction(
        &self,
        transaction: &HostTransaction,
        history: &[TransactionRecord],
    ) -> Result<TransactionResult> {
        let target = match RefundTarget::resolve(transaction, history) {
            Ok(target) => target,
            Err(e) => {
                let amount = transaction.payment_amount;
                self.reject(Operation::Refund, &transaction.order_number, amount, &e);
                return Err(e);
            }
        };
        self.refund(&target.reference, transaction.payment_amount, &target.order_id).await
    }

    /// Builds, submits and normalizes a card transaction.
    async fn card_operation(
        &self,
        operation: Operation,
        txn_type: TxnType,
        request: &TransactionRequest,
        instrument: PaymentInstrument,
    ) -> Result<TransactionResult> {
        let submission = Submission {
            operation,
            order_id: request.order_id(),
            amount: request.amount(),
            card: Some(format!("****{}", instrument.last_four())),
        };
        let built = builder::card_request(txn_type, request, &instrument, &self.config);
        drop(instrument);

        self.execute(submission, built).await
    }

    /// Resolves credentials, submits once and normalizes the reply.
    ///
    /// Every failure up to the send is returned as an error; everything after
    /// it becomes a result.
    #[instrument(
        skip_all,
        fields(
            operation = %submission.operation,
            order_id = submission.order_id,
            amount = %submission.amount,
            test_mode = self.config.is_test_mode()
        )
    )]
    async fn execute(
        &self,
        submission: Submission<'_>,
        built: Result<ProcessorRequest>,
    ) -> Result<TransactionResult> {
        let request_id = Uuid::new_v4();
        let prepared =
            built.and_then(|request| Ok((request, self.config.resolve_credentials(&self.env)?)));

        let (request, credentials) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                self.reject(submission.operation, submission.order_id, submission.amount, &e);
                return Err(e);
            }
        };

        let mut attempted =
            self.event(AuditEventType::TransactionAttempted, &submission, request_id);
        if let Some(ref card) = submission.card {
            attempted = attempted.with_card(card);
        }
        audit_log(&attempted);

        let target = SubmitTarget {
            endpoint: self.config.endpoint_url(),
            credentials: &credentials,
            test_mode: self.config.is_test_mode(),
        };

        tracing::debug!(protocol = self.transport.protocol_name(), "submitting to processor");
        let started = Instant::now();
        let response = match self.transport.submit(target, &request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "processor request was not delivered");
                audit_log(
                    &self
                        .event(AuditEventType::TransactionRejected, &submission, request_id)
                        .with_error(&e.to_string())
                        .with_duration(started.elapsed()),
                );
                return Err(e);
            }
        };
        drop(request);

        let result = normalize_response(response.as_ref(), &self.config.approval_codes);

        audit_log(
            &self
                .event(result.outcome().into(), &submission, request_id)
                .with_response_code(result.code())
                .with_reference(result.reference())
                .with_duration(started.elapsed()),
        );
        if response.is_none() {
            tracing::warn!("processor returned no usable response");
        }
        tracing::info!(
            outcome = %result.outcome(),
            response_code = result.code(),
            reference = result.reference(),
            "transaction completed"
        );

        Ok(result)
    }

    fn event(
        &self,
        event_type: AuditEventType,
        submission: &Submission<'_>,
        request_id: Uuid,
    ) -> AuditEvent {
        AuditEvent::new(event_type, submission.operation, request_id)
            .with_test_mode(self.config.is_test_mode())
            .with_order_id(submission.order_id)
            .with_amount(submission.amount.to_processor_string())
    }

    /// Records an operation that failed before anything was sent.
    fn reject(&self, operation: Operation, order_id: &str, amount: Amount, error: &GatewayError) {
        tracing::warn!(
            operation = %operation,
            order_id,
            error = %error,
            "operation rejected before submission"
        );
        audit!(
            AuditEventType::TransactionRejected,
            operation,
            Uuid::new_v4(),
            with_test_mode(self.config.is_test_mode()),
            with_order_id(order_id),
            with_amount(amount.to_processor_string()),
            with_error(&error.to_string())
        );
    }

    fn unsupported<R>(&self, operation: Operation) -> Result<R> {
        tracing::warn!(operation = %operation, "unsupported operation requested");
        audit!(
            AuditEventType::OperationNotSupported,
            operation,
            Uuid::new_v4(),
            with_test_mode(self.config.is_test_mode())
        );
        Err(GatewayError::NotSupported(operation))
    }
}

impl<T: Transport, E: EnvLookup> PaymentGateway for MonerisGateway<T, E> {
    async fn authorize<'a>(
        &'a self,
        request: &'a TransactionRequest,
        instrument: PaymentInstrument,
    ) -> Result<TransactionResult> {
        self.card_operation(Operation::Authorize, TxnType::Preauth, request, instrument).await
    }

    async fn capture<'a>(
        &'a self,
        reference: &'a str,
        amount: Amount,
        order_id: &'a str,
    ) -> Result<TransactionResult> {
        let submission = Submission { operation: Operation::Capture, order_id, amount, card: None };
        let built = builder::completion_request(reference, amount, order_id);
        self.execute(submission, built).await
    }

    async fn purchase<'a>(
        &'a self,
        request: &'a TransactionRequest,
        instrument: PaymentInstrument,
    ) -> Result<TransactionResult> {
        self.card_operation(Operation::Purchase, TxnType::Purchase, request, instrument).await
    }

    async fn refund<'a>(
        &'a self,
        prior_reference: &'a str,
        amount: Amount,
        order_id: &'a str,
    ) -> Result<TransactionResult> {
        let submission = Submission { operation: Operation::Refund, order_id, amount, card: None };
        let built = builder::refund_request(prior_reference, amount, order_id, &self.config);
        self.execute(submission, built).await
    }

    fn supports(&self, operation: Operation) -> bool {
        matches!(
            operation,
            Operation::Authorize
                | Operation::Capture
                | Operation::Purchase
                | Operation::Refund
                | Operation::PartialRefund
        )
    }

    fn complete_authorize(&self, _reference: &str) -> Result<TransactionResult> {
        self.unsupported(Operation::CompleteAuthorize)
    }

    fn complete_purchase(&self, _reference: &str) -> Result<TransactionResult> {
        self.unsupported(Operation::CompletePurchase)
    }

    fn create_payment_source(&self, _form: PaymentForm, _customer_id: &str) -> Result<String> {
        self.unsupported(Operation::CreatePaymentSource)
    }

    fn delete_payment_source(&self, _token: &str) -> Result<()> {
        self.unsupported(Operation::DeletePaymentSource)
    }

    fn process_webhook(&self, _payload: &[u8]) -> Result<()> {
        self.unsupported(Operation::Webhook)
    }
}
