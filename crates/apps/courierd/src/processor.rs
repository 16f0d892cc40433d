//! The command dispatch core.
//!
//! One envelope at a time: decode, resolve the payload by command name,
//! run the handler. Provider reads complete inline; sends register a
//! correlation waiter and submit to the platform, with the terminal
//! `response` written by a spawned local task once the completion signal
//! re-enters the event queue. No handler error ever escapes to the loop —
//! availability of the stream is the top invariant.

use std::collections::BTreeSet;
use std::fs;
use std::rc::Rc;

use log::{debug, warn};
use serde_json::Value;
use tokio::task;

use courier_proto::{
    chat_guid_recipients, decode_line, strip_mms_prefix, ChatInfo, CommandPayload, Envelope,
    ErrorBody, Message, PushKey, WireError, CHAT_GUID_PREFIX, MMS_GUID_PREFIX,
};
use courier_telephony::{ContactAdapter, MmsAdapter, SmsAdapter, ThreadAdapter};

use crate::bridge::BridgeHandle;
use crate::correlator::Correlator;
use crate::error::DaemonError;
use crate::events::Event;
use crate::platform::{JobScheduler, PermissionGate};
use crate::sender::{format_file_size, OutgoingSend, SendOutcome, SendTransaction, MAX_FILE_SIZE};

const NO_PERMISSION_MESSAGE: &str = "courier is missing SMS permissions";

/// The store adapters the processor reads from.
pub struct StoreAdapters {
    pub sms: SmsAdapter,
    pub mms: MmsAdapter,
    pub threads: ThreadAdapter,
    pub contacts: ContactAdapter,
}

/// Deployment knobs for the one processor. The two historical bridge
/// variants are the two corners of the capability flags: the
/// feature-complete one (contacts and groups on, the default) and the
/// reduced direct-transaction one (both off).
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub push_key: Option<PushKey>,
    /// Messages older than this Unix-seconds cutover get their `mms_`
    /// guid prefix stripped on backfill reads. 0 disables the rewrite.
    pub use_old_mms_guids_until: i64,
    pub supports_contacts: bool,
    pub supports_groups: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            push_key: None,
            use_old_mms_guids_until: 0,
            supports_contacts: true,
            supports_groups: true,
        }
    }
}

pub struct CommandProcessor {
    bridge: BridgeHandle,
    correlator: Rc<Correlator>,
    store: StoreAdapters,
    transaction: Rc<dyn SendTransaction>,
    permissions: Rc<dyn PermissionGate>,
    scheduler: Rc<dyn JobScheduler>,
    options: ProcessorOptions,
}

impl CommandProcessor {
    pub fn new(
        bridge: BridgeHandle,
        store: StoreAdapters,
        transaction: Rc<dyn SendTransaction>,
        permissions: Rc<dyn PermissionGate>,
        scheduler: Rc<dyn JobScheduler>,
        options: ProcessorOptions,
    ) -> Self {
        let correlator = bridge.correlator().clone();
        Self {
            bridge,
            correlator,
            store,
            transaction,
            permissions,
            scheduler,
            options,
        }
    }

    /// Handles one queue event. Never panics, never propagates.
    pub fn handle_event(&self, event: Event) {
        match event {
            Event::Line(line) => self.handle_line(&line),
            Event::Passthrough(line) => debug!("bridge: {line}"),
            Event::SendResult {
                command_id,
                outcome,
            } => {
                let result = match outcome {
                    SendOutcome::Sent { guid, timestamp } => {
                        Ok(serde_json::json!({ "guid": guid, "timestamp": timestamp }))
                    }
                    SendOutcome::Failed { reason } => Err(ErrorBody::new("send_failure", reason)),
                };
                self.correlator.fulfill(command_id, result);
            }
            Event::Eof => debug!("transport closed"),
        }
    }

    /// Handles one raw line. Malformed JSON, an unusable payload, or a
    /// failed handler all end in a log line; the stream keeps flowing.
    pub fn handle_line(&self, line: &str) {
        let envelope = match decode_line(line) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("dropping malformed frame: {err}");
                return;
            }
        };
        let payload = match envelope.payload() {
            Ok(payload) => payload,
            Err(err) => {
                warn!("dropping frame: {err}");
                return;
            }
        };
        if let Err(err) = self.dispatch(&envelope, payload) {
            warn!("command '{}' failed: {err}", envelope.command);
        }
    }

    fn dispatch(&self, envelope: &Envelope, payload: CommandPayload) -> Result<(), DaemonError> {
        match payload {
            CommandPayload::PreStartupSync => {
                if let Some(push_key) = &self.options.push_key {
                    self.bridge
                        .send(Envelope::notification("push_key", serde_json::to_value(push_key)?));
                }
                if let Some(id) = envelope.id {
                    self.bridge.send(Envelope::response(id, Value::Null));
                }
                Ok(())
            }
            CommandPayload::GetChat(get) => {
                let id = require_id(envelope)?;
                let recipients = self.recipients(&get.chat_guid);
                let chat_name = if self.options.supports_contacts {
                    self.store
                        .contacts
                        .contacts(&recipients)?
                        .into_iter()
                        .map(|contact| contact.nickname)
                        .collect::<Vec<_>>()
                        .join(", ")
                } else {
                    get.chat_guid
                        .strip_prefix(CHAT_GUID_PREFIX)
                        .unwrap_or(&get.chat_guid)
                        .to_string()
                };
                self.respond(id, &ChatInfo {
                    chat_name,
                    recipients,
                })
            }
            CommandPayload::GetContact(get) => {
                let id = require_id(envelope)?;
                let contact = self.store.contacts.contact(&get.user_guid)?;
                self.respond(id, &contact)
            }
            CommandPayload::SendMessage(send) => {
                let id = require_id(envelope)?;
                if !self.permissions.has_sms_permissions() {
                    self.bridge
                        .send(Envelope::error(id, &ErrorBody::no_permission(NO_PERMISSION_MESSAGE)));
                    return Ok(());
                }
                let thread_id = self
                    .store
                    .threads
                    .thread_for_chat_guid(&send.chat_guid)?
                    .unwrap_or(0);
                let recipients = self.recipients(&send.chat_guid);
                self.await_send_result(id);
                self.transaction.submit(
                    OutgoingSend::Text {
                        text: send.text,
                        recipients,
                        thread_id,
                    },
                    id,
                );
                Ok(())
            }
            CommandPayload::SendMedia(send) => {
                let id = require_id(envelope)?;
                if !self.permissions.has_sms_permissions() {
                    self.bridge
                        .send(Envelope::error(id, &ErrorBody::no_permission(NO_PERMISSION_MESSAGE)));
                    return Ok(());
                }
                let size = match fs::metadata(&send.path_on_disk) {
                    Ok(meta) => meta.len(),
                    Err(err) => {
                        warn!("cannot stat media {}: {err}", send.path_on_disk);
                        return Ok(());
                    }
                };
                if size > MAX_FILE_SIZE {
                    let body = ErrorBody::size_limit_exceeded(format!(
                        "attachment too large ({} > {})",
                        format_file_size(size),
                        format_file_size(MAX_FILE_SIZE),
                    ));
                    self.bridge.send(Envelope::error(id, &body));
                    return Ok(());
                }
                let bytes = fs::read(&send.path_on_disk)?;
                let thread_id = self
                    .store
                    .threads
                    .thread_for_chat_guid(&send.chat_guid)?
                    .unwrap_or(0);
                let recipients = self.recipients(&send.chat_guid);
                self.await_send_result(id);
                self.transaction.submit(
                    OutgoingSend::Media {
                        recipients,
                        bytes,
                        mime_type: send.mime_type,
                        file_name: send.file_name,
                        thread_id,
                    },
                    id,
                );
                Ok(())
            }
            CommandPayload::GetChats(get) => {
                let id = require_id(envelope)?;
                let mut threads = BTreeSet::new();
                // SMS dates are milliseconds, MMS dates seconds.
                threads.extend(self.store.sms.thread_ids_after(get.min_timestamp * 1000)?);
                threads.extend(self.store.mms.thread_ids_after(get.min_timestamp)?);
                let mut guids = BTreeSet::new();
                for thread_id in threads {
                    if let Some(guid) = self.store.threads.chat_guid(thread_id)? {
                        guids.insert(guid);
                    }
                }
                self.respond(id, &guids.into_iter().collect::<Vec<_>>())
            }
            CommandPayload::GetMessagesAfter(get) => {
                let id = require_id(envelope)?;
                let pairs = match self.store.threads.thread_for_chat_guid(&get.chat_guid)? {
                    Some(thread_id) => self.store.threads.messages_after(thread_id, get.timestamp)?,
                    None => Vec::new(),
                };
                let mut messages = self.resolve_messages(&pairs)?;
                let cutover = self.options.use_old_mms_guids_until;
                if get.timestamp < cutover {
                    for message in &mut messages {
                        if message.timestamp < cutover {
                            message.guid = strip_mms_prefix(&message.guid);
                        }
                    }
                }
                self.respond(id, &messages)
            }
            CommandPayload::GetRecentMessages(get) => {
                let id = require_id(envelope)?;
                let limit = usize::try_from(get.limit).unwrap_or(0);
                let pairs = match self.store.threads.thread_for_chat_guid(&get.chat_guid)? {
                    Some(thread_id) => self.store.threads.recent_messages(thread_id, limit)?,
                    None => Vec::new(),
                };
                let messages = self.resolve_messages(&pairs)?;
                self.respond(id, &messages)
            }
            CommandPayload::GetChatAvatar => {
                let id = require_id(envelope)?;
                self.bridge.send(Envelope::response(id, Value::Null));
                Ok(())
            }
            CommandPayload::Response(data) => {
                match envelope.id {
                    Some(id) => {
                        debug!("response #{id}: {data}");
                        self.correlator.fulfill(id, Ok(data));
                    }
                    None => warn!("response frame without id, dropping"),
                }
                Ok(())
            }
            CommandPayload::Unknown { command, .. } => {
                warn!("unhandled command: {command}");
                Ok(())
            }
        }
    }

    /// Forwards a stored message to the bridge as a `message` request and
    /// waits for the acknowledgement. On failure the deferred-work
    /// scheduler gets a chance to retry later.
    pub async fn forward_message(&self, guid: &str) {
        if let Err(err) = self.try_forward(guid).await {
            warn!("forward of {guid} failed: {err}");
            self.scheduler.enqueue_forward(guid);
        }
    }

    async fn try_forward(&self, guid: &str) -> Result<(), DaemonError> {
        let Some(message) = self.message_by_guid(guid)? else {
            warn!("no message {guid} to forward");
            return Ok(());
        };
        let ack = self
            .bridge
            .request("message", serde_json::to_value(&message)?)
            .await?;
        debug!("bridge acknowledged {guid}: {ack}");
        Ok(())
    }

    /// Resolves a protocol guid against the right adapter.
    pub fn message_by_guid(&self, guid: &str) -> Result<Option<Message>, DaemonError> {
        if let Some(raw) = guid.strip_prefix(MMS_GUID_PREFIX) {
            let Ok(native_id) = raw.parse::<i64>() else {
                return Ok(None);
            };
            Ok(self.store.mms.message(native_id)?)
        } else {
            let Ok(native_id) = guid.parse::<i64>() else {
                return Ok(None);
            };
            Ok(self.store.sms.message(native_id)?)
        }
    }

    fn recipients(&self, chat_guid: &str) -> Vec<String> {
        if self.options.supports_groups {
            chat_guid_recipients(chat_guid)
        } else {
            // Reduced configuration: the guid names one literal address.
            let stripped = chat_guid.strip_prefix(CHAT_GUID_PREFIX).unwrap_or(chat_guid);
            vec![stripped.to_string()]
        }
    }

    fn resolve_messages(&self, pairs: &[(i64, bool)]) -> Result<Vec<Message>, DaemonError> {
        let mut messages = Vec::with_capacity(pairs.len());
        for &(native_id, is_mms) in pairs {
            let message = if is_mms {
                self.store.mms.message(native_id)?
            } else {
                self.store.sms.message(native_id)?
            };
            if let Some(message) = message {
                messages.push(message);
            }
        }
        Ok(messages)
    }

    /// Registers the request id and spawns the task that writes the
    /// terminal reply once the send completes. Called in the same
    /// dispatch turn as the submission, so completion can never race the
    /// registration.
    fn await_send_result(&self, id: i64) {
        let rx = self.correlator.register(id);
        let bridge = self.bridge.clone();
        task::spawn_local(async move {
            match rx.await {
                Ok(Ok(value)) => bridge.send(Envelope::response(id, value)),
                Ok(Err(body)) => bridge.send(Envelope::error(id, &body)),
                Err(_) => debug!("send waiter for #{id} dropped"),
            }
        });
    }

    fn respond<T: serde::Serialize>(&self, id: i64, data: &T) -> Result<(), DaemonError> {
        self.bridge
            .send(Envelope::response(id, serde_json::to_value(data)?));
        Ok(())
    }
}

fn require_id(envelope: &Envelope) -> Result<i64, DaemonError> {
    envelope.id.ok_or_else(|| {
        DaemonError::Wire(WireError::MissingId {
            command: envelope.command.clone(),
        })
    })
}
