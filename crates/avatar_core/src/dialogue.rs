//! crates/avatar_core/src/dialogue.rs
//!
//! The dialogue controller: a per-event state machine that walks a session
//! through "enter date → choose gender → result → report".
//!
//! The stage is derived from the stored session fields, so the controller keeps
//! no state of its own apart from its collaborators.

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::birth_date::BirthDate;
use crate::calculator::AvatarCalculator;
use crate::domain::{
    DialogueStage, EventKind, Gender, InboundEvent, InlineButton, Keyboard, OutboundMessage,
    SessionState,
};
use crate::ports::{ChatTransport, ReportRenderer};
use crate::render::render_chat_messages;
use crate::report::AvatarReport;
use crate::session::{SessionHandle, SessionStore};
use crate::texts;

/// Drives conversations. Created once at startup and shared by all handlers.
pub struct DialogueController {
    store: Arc<SessionStore>,
    calculator: AvatarCalculator,
    transport: Arc<dyn ChatTransport>,
    renderer: Arc<dyn ReportRenderer>,
    consultation_url: String,
}

impl DialogueController {
    pub fn new(
        store: Arc<SessionStore>,
        calculator: AvatarCalculator,
        transport: Arc<dyn ChatTransport>,
        renderer: Arc<dyn ReportRenderer>,
        consultation_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            calculator,
            transport,
            renderer,
            consultation_url: consultation_url.into(),
        }
    }

    /// Handles one inbound event, validating dates against the local calendar.
    pub async fn handle(&self, event: InboundEvent) {
        self.handle_on(event, Local::now().date_naive()).await
    }

    /// Handles one inbound event, treating `today` as the current date.
    pub async fn handle_on(&self, event: InboundEvent, today: NaiveDate) {
        let Some(chat_id) = event.chat_id else {
            debug!("Dropping event without a chat");
            return;
        };
        let session = self.store.get_or_create(event.user_id, event.chat_id).await;

        match event.kind {
            EventKind::Text(text) => self.on_text(chat_id, session, &text, today).await,
            EventKind::Callback { id, data } => {
                self.on_callback(chat_id, session, &id, &data).await
            }
        }
    }

    //=====================================================================================
    // Text Messages
    //=====================================================================================

    async fn on_text(
        &self,
        chat_id: i64,
        session: Option<SessionHandle>,
        text: &str,
        today: NaiveDate,
    ) {
        let text = text.trim();

        if text.contains(texts::ENTER_DATE_TRIGGER) {
            update(&session, SessionState::clear).await;
            self.reply(chat_id, main_menu(texts::REQUEST_BIRTH_DATE)).await;
            return;
        }

        if is_start_command(text) {
            update(&session, SessionState::clear).await;
            self.reply(chat_id, OutboundMessage::text(texts::WELCOME)).await;
            self.reply(chat_id, main_menu(texts::REQUEST_BIRTH_DATE)).await;
            return;
        }

        if text.contains(texts::CONSULTATION_TRIGGER) {
            let keyboard = Keyboard::Inline(vec![vec![InlineButton::url(
                texts::SITE_BUTTON,
                self.consultation_url.as_str(),
            )]]);
            self.reply(
                chat_id,
                OutboundMessage::with_keyboard(texts::CONSULTATION_REPLY, keyboard),
            )
            .await;
            return;
        }

        let state = snapshot(&session).await;

        if is_next_phrase(text) {
            self.send_report(chat_id, &state).await;
            return;
        }

        match state.stage() {
            DialogueStage::AwaitingDate => match BirthDate::parse(text, today) {
                Ok(date) => {
                    debug!(chat_id, date = %date.formatted(), "Birth date accepted");
                    update(&session, |s| {
                        s.birth_day = Some(date.day);
                        s.birth_month = Some(date.month);
                        s.birth_year = Some(date.year);
                        s.gender = None;
                    })
                    .await;
                    self.reply(chat_id, gender_prompt(texts::REQUEST_GENDER)).await;
                }
                Err(e) => {
                    debug!(chat_id, error = %e, "Rejected birth date");
                    self.reply(chat_id, main_menu(texts::INVALID_DATE)).await;
                }
            },
            DialogueStage::AwaitingGender => {
                self.reply(chat_id, OutboundMessage::text(texts::CHOOSE_GENDER_WITH_BUTTONS))
                    .await;
            }
            DialogueStage::Complete => {
                debug!(chat_id, "Ignoring text after the result was delivered");
            }
        }
    }

    //=====================================================================================
    // Button Presses
    //=====================================================================================

    async fn on_callback(
        &self,
        chat_id: i64,
        session: Option<SessionHandle>,
        callback_id: &str,
        data: &str,
    ) {
        if let Err(e) = self.transport.acknowledge(callback_id).await {
            warn!("Failed to acknowledge callback {}: {:?}", callback_id, e);
        }

        if let Some(gender) = Gender::from_callback(data) {
            let state = snapshot(&session).await;
            let Some((day, month, year)) = state.birth_date() else {
                self.reply(chat_id, main_menu(texts::ENTER_DATE_FIRST)).await;
                return;
            };
            update(&session, |s| s.gender = Some(gender)).await;
            info!(chat_id, %gender, "Gender chosen, rendering result");
            self.send_result(chat_id, BirthDate { day, month, year }, gender)
                .await;
            return;
        }

        if data == texts::DOWNLOAD_PDF_CALLBACK {
            let state = snapshot(&session).await;
            self.send_report(chat_id, &state).await;
            return;
        }

        debug!(chat_id, data, "Ignoring unknown callback");
    }

    //=====================================================================================
    // Rendering
    //=====================================================================================

    /// Sends the full chat rendering, the follow-up keyboard and the document.
    async fn send_result(&self, chat_id: i64, date: BirthDate, gender: Gender) {
        let Some(result) = self
            .calculator
            .calculate(date.day, date.month, date.year, gender)
        else {
            warn!(chat_id, "Calculation failed for stored birth date");
            self.reply(chat_id, OutboundMessage::text(texts::CALCULATION_FAILED))
                .await;
            return;
        };

        let report = AvatarReport::build(date, &result, &self.consultation_url);
        for message in render_chat_messages(&report, &self.consultation_url) {
            self.reply(chat_id, OutboundMessage::text(message)).await;
        }

        let follow_up = Keyboard::Inline(vec![
            vec![InlineButton::callback(
                texts::DOWNLOAD_PDF_BUTTON,
                texts::DOWNLOAD_PDF_CALLBACK,
            )],
            vec![InlineButton::url(
                texts::SITE_BUTTON,
                self.consultation_url.as_str(),
            )],
        ]);
        self.reply(chat_id, OutboundMessage::with_keyboard(texts::FOLLOW_UP, follow_up))
            .await;

        self.deliver_report(chat_id, &report).await;
    }

    /// Rebuilds the document from the stored session fields.
    async fn send_report(&self, chat_id: i64, state: &SessionState) {
        let Some((day, month, year)) = state.birth_date() else {
            self.reply(chat_id, main_menu(texts::ENTER_DATE_AGAIN)).await;
            return;
        };
        let Some(gender) = state.gender else {
            self.reply(chat_id, gender_prompt(texts::REQUEST_GENDER)).await;
            return;
        };

        let Some(result) = self.calculator.calculate(day, month, year, gender) else {
            self.reply(chat_id, main_menu(texts::REPORT_FAILED)).await;
            return;
        };
        let report = AvatarReport::build(
            BirthDate { day, month, year },
            &result,
            &self.consultation_url,
        );
        self.deliver_report(chat_id, &report).await;
    }

    async fn deliver_report(&self, chat_id: i64, report: &AvatarReport) {
        let bytes = match self.renderer.render_report(report).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to render report for chat {}: {:?}", chat_id, e);
                self.reply(chat_id, main_menu(texts::REPORT_UNAVAILABLE)).await;
                return;
            }
        };

        let document = OutboundMessage::Document {
            bytes,
            filename: report.filename(),
            caption: texts::REPORT_CAPTION.to_string(),
        };
        if let Err(e) = self.transport.send(chat_id, document).await {
            error!("Failed to send report to chat {}: {:?}", chat_id, e);
            self.reply(chat_id, main_menu(texts::REPORT_UNAVAILABLE)).await;
        }
    }

    async fn reply(&self, chat_id: i64, message: OutboundMessage) {
        if let Err(e) = self.transport.send(chat_id, message).await {
            error!("Failed to deliver reply to chat {}: {:?}", chat_id, e);
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn snapshot(session: &Option<SessionHandle>) -> SessionState {
    match session {
        Some(handle) => handle.lock().await.clone(),
        None => SessionState::default(),
    }
}

async fn update(session: &Option<SessionHandle>, f: impl FnOnce(&mut SessionState)) {
    if let Some(handle) = session {
        f(&mut *handle.lock().await);
    }
}

fn main_menu(text: &str) -> OutboundMessage {
    OutboundMessage::with_keyboard(text, Keyboard::MainMenu)
}

fn gender_prompt(text: &str) -> OutboundMessage {
    OutboundMessage::with_keyboard(
        text,
        Keyboard::Inline(vec![
            vec![InlineButton::callback(
                texts::GENDER_MALE_BUTTON,
                Gender::Male.callback_data(),
            )],
            vec![InlineButton::callback(
                texts::GENDER_FEMALE_BUTTON,
                Gender::Female.callback_data(),
            )],
        ]),
    )
}

/// `/start`, also in its `/start@bot_name` and `/start payload` forms.
fn is_start_command(text: &str) -> bool {
    text == "/start" || text.starts_with("/start@") || text.starts_with("/start ")
}

fn is_next_phrase(text: &str) -> bool {
    matches!(text.to_lowercase().as_str(), "дальше" | "показать варианты")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentTable;
    use crate::domain::ButtonAction;
    use crate::ports::{PortError, PortResult};
    use crate::session::SessionKey;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;

    const URL: &str = "https://avalik-avatar.ru";
    const CHAT: i64 = 100;
    const USER: i64 = 7;

    #[derive(Default)]
    struct RecordingTransport {
        sent: StdMutex<Vec<(i64, OutboundMessage)>>,
        acknowledged: StdMutex<Vec<String>>,
        reject_documents: bool,
    }

    impl RecordingTransport {
        fn take(&self) -> Vec<OutboundMessage> {
            self.sent
                .lock()
                .unwrap()
                .drain(..)
                .map(|(_, message)| message)
                .collect()
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send(&self, chat_id: i64, message: OutboundMessage) -> PortResult<()> {
            if self.reject_documents && matches!(message, OutboundMessage::Document { .. }) {
                return Err(PortError::Unexpected("document too large".to_string()));
            }
            self.sent.lock().unwrap().push((chat_id, message));
            Ok(())
        }

        async fn acknowledge(&self, callback_id: &str) -> PortResult<()> {
            self.acknowledged
                .lock()
                .unwrap()
                .push(callback_id.to_string());
            Ok(())
        }
    }

    struct StubRenderer {
        fail: bool,
    }

    #[async_trait]
    impl ReportRenderer for StubRenderer {
        async fn render_report(&self, report: &AvatarReport) -> PortResult<Vec<u8>> {
            if self.fail {
                return Err(PortError::Unexpected("renderer offline".to_string()));
            }
            Ok(format!("PDF {}", report.birth_date.formatted()).into_bytes())
        }
    }

    struct Harness {
        controller: DialogueController,
        transport: Arc<RecordingTransport>,
        store: Arc<SessionStore>,
    }

    fn harness_with(transport: RecordingTransport, renderer_fails: bool) -> Harness {
        let store = Arc::new(SessionStore::new());
        let transport = Arc::new(transport);
        let calculator = AvatarCalculator::new(Arc::new(ContentTable::embedded().unwrap()));
        let controller = DialogueController::new(
            store.clone(),
            calculator,
            transport.clone(),
            Arc::new(StubRenderer {
                fail: renderer_fails,
            }),
            URL,
        );
        Harness {
            controller,
            transport,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingTransport::default(), false)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn text_from(user: Option<i64>, chat: Option<i64>, text: &str) -> InboundEvent {
        InboundEvent {
            user_id: user,
            chat_id: chat,
            kind: EventKind::Text(text.to_string()),
        }
    }

    fn text(text: &str) -> InboundEvent {
        text_from(Some(USER), Some(CHAT), text)
    }

    fn press(data: &str) -> InboundEvent {
        InboundEvent {
            user_id: Some(USER),
            chat_id: Some(CHAT),
            kind: EventKind::Callback {
                id: format!("cb-{data}"),
                data: data.to_string(),
            },
        }
    }

    fn texts_of(messages: &[OutboundMessage]) -> Vec<&str> {
        messages
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::Text { text, .. } => Some(text.as_str()),
                OutboundMessage::Document { .. } => None,
            })
            .collect()
    }

    fn documents_of(messages: &[OutboundMessage]) -> Vec<(&str, &[u8])> {
        messages
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::Document {
                    filename, bytes, ..
                } => Some((filename.as_str(), bytes.as_slice())),
                OutboundMessage::Text { .. } => None,
            })
            .collect()
    }

    async fn stage(h: &Harness) -> DialogueStage {
        h.store
            .get(SessionKey {
                user_id: USER,
                chat_id: CHAT,
            })
            .await
            .unwrap_or_default()
            .stage()
    }

    async fn complete_flow(h: &Harness) {
        h.controller.handle_on(text("15.03.1990"), today()).await;
        h.controller.handle_on(press("gender_female"), today()).await;
        h.transport.take();
    }

    #[tokio::test]
    async fn start_greets_and_asks_for_date() {
        let h = harness();
        h.controller.handle_on(text("/start"), today()).await;

        let sent = h.transport.take();
        assert_eq!(
            sent,
            vec![
                OutboundMessage::text(texts::WELCOME),
                OutboundMessage::with_keyboard(texts::REQUEST_BIRTH_DATE, Keyboard::MainMenu),
            ]
        );
        assert_eq!(stage(&h).await, DialogueStage::AwaitingDate);
    }

    #[tokio::test]
    async fn valid_date_moves_to_gender_choice() {
        let h = harness();
        h.controller.handle_on(text(" 5/3/1990 "), today()).await;

        let sent = h.transport.take();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            OutboundMessage::Text {
                text,
                keyboard: Some(Keyboard::Inline(rows)),
                ..
            } => {
                assert_eq!(text, texts::REQUEST_GENDER);
                assert_eq!(
                    rows[0][0].action,
                    ButtonAction::Callback("gender_male".to_string())
                );
                assert_eq!(
                    rows[1][0].action,
                    ButtonAction::Callback("gender_female".to_string())
                );
            }
            other => panic!("unexpected reply {other:?}"),
        }

        let state = h
            .store
            .get(SessionKey {
                user_id: USER,
                chat_id: CHAT,
            })
            .await
            .unwrap();
        assert_eq!(state.birth_date(), Some((5, 3, 1990)));
        assert_eq!(state.stage(), DialogueStage::AwaitingGender);
    }

    #[tokio::test]
    async fn invalid_and_future_dates_are_rejected() {
        let h = harness();
        for input in ["31.02.2000", "00.01.2000", "19.10.2026", "вчера"] {
            h.controller.handle_on(text(input), today()).await;
            let sent = h.transport.take();
            assert_eq!(
                sent,
                vec![OutboundMessage::with_keyboard(
                    texts::INVALID_DATE,
                    Keyboard::MainMenu
                )],
                "{input}"
            );
            assert_eq!(stage(&h).await, DialogueStage::AwaitingDate);
        }
    }

    #[tokio::test]
    async fn text_while_awaiting_gender_asks_for_buttons() {
        let h = harness();
        h.controller.handle_on(text("15.03.1990"), today()).await;
        h.transport.take();

        h.controller.handle_on(text("мужской"), today()).await;
        assert_eq!(
            texts_of(&h.transport.take()),
            vec![texts::CHOOSE_GENDER_WITH_BUTTONS]
        );
        assert_eq!(stage(&h).await, DialogueStage::AwaitingGender);
    }

    #[tokio::test]
    async fn start_twice_from_gender_choice_resets_the_session() {
        let h = harness();
        h.controller.handle_on(text("15.03.1990"), today()).await;
        h.controller.handle_on(text("/start"), today()).await;
        h.controller.handle_on(text("/start"), today()).await;

        let state = h
            .store
            .get(SessionKey {
                user_id: USER,
                chat_id: CHAT,
            })
            .await
            .unwrap();
        assert_eq!(state, SessionState::default());
        assert_eq!(state.stage(), DialogueStage::AwaitingDate);
    }

    #[tokio::test]
    async fn enter_date_button_clears_a_complete_session() {
        let h = harness();
        complete_flow(&h).await;

        h.controller
            .handle_on(text(texts::MENU_ENTER_DATE), today())
            .await;
        assert_eq!(
            h.transport.take(),
            vec![OutboundMessage::with_keyboard(
                texts::REQUEST_BIRTH_DATE,
                Keyboard::MainMenu
            )]
        );
        assert_eq!(stage(&h).await, DialogueStage::AwaitingDate);
    }

    #[tokio::test]
    async fn gender_choice_renders_result_and_sends_report() {
        let h = harness();
        h.controller.handle_on(text("15.03.1990"), today()).await;
        h.transport.take();

        h.controller.handle_on(press("gender_male"), today()).await;

        assert_eq!(
            *h.transport.acknowledged.lock().unwrap(),
            vec!["cb-gender_male".to_string()]
        );
        let sent = h.transport.take();
        let texts_sent = texts_of(&sent);
        assert!(texts_sent[1].contains("Дьявол (15)"));
        assert_eq!(*texts_sent.last().unwrap(), texts::FOLLOW_UP);
        assert_eq!(
            documents_of(&sent),
            vec![("avatar-report-15-03-1990.pdf", "PDF 15.03.1990".as_bytes())]
        );
        assert_eq!(stage(&h).await, DialogueStage::Complete);
    }

    #[tokio::test]
    async fn gender_without_date_asks_for_date_first() {
        let h = harness();
        h.controller.handle_on(press("gender_female"), today()).await;
        assert_eq!(
            h.transport.take(),
            vec![OutboundMessage::with_keyboard(
                texts::ENTER_DATE_FIRST,
                Keyboard::MainMenu
            )]
        );
        assert_eq!(stage(&h).await, DialogueStage::AwaitingDate);
    }

    #[tokio::test]
    async fn text_after_completion_is_ignored() {
        let h = harness();
        complete_flow(&h).await;

        h.controller.handle_on(text("20.04.1991"), today()).await;
        assert!(h.transport.take().is_empty());
        assert_eq!(stage(&h).await, DialogueStage::Complete);
    }

    #[tokio::test]
    async fn next_phrase_and_download_button_resend_the_stored_report() {
        let h = harness();
        complete_flow(&h).await;

        h.controller.handle_on(text("дальше"), today()).await;
        h.controller.handle_on(press("download_pdf"), today()).await;
        h.controller
            .handle_on(text("Показать варианты"), today())
            .await;

        let sent = h.transport.take();
        assert_eq!(documents_of(&sent).len(), 3);
        assert!(documents_of(&sent)
            .iter()
            .all(|(name, _)| *name == "avatar-report-15-03-1990.pdf"));
        assert_eq!(stage(&h).await, DialogueStage::Complete);
    }

    #[tokio::test]
    async fn report_request_without_date_asks_again() {
        let h = harness();
        h.controller.handle_on(press("download_pdf"), today()).await;
        assert_eq!(
            h.transport.take(),
            vec![OutboundMessage::with_keyboard(
                texts::ENTER_DATE_AGAIN,
                Keyboard::MainMenu
            )]
        );
    }

    #[tokio::test]
    async fn consultation_replies_with_link_and_keeps_state() {
        let h = harness();
        h.controller.handle_on(text("15.03.1990"), today()).await;
        h.transport.take();

        h.controller
            .handle_on(text(texts::MENU_CONSULTATION), today())
            .await;
        let sent = h.transport.take();
        assert_eq!(
            sent,
            vec![OutboundMessage::with_keyboard(
                texts::CONSULTATION_REPLY,
                Keyboard::Inline(vec![vec![InlineButton::url(texts::SITE_BUTTON, URL)]])
            )]
        );
        assert_eq!(stage(&h).await, DialogueStage::AwaitingGender);
    }

    #[tokio::test]
    async fn renderer_failure_becomes_a_retry_later_reply() {
        let h = harness_with(RecordingTransport::default(), true);
        h.controller.handle_on(text("15.03.1990"), today()).await;
        h.controller.handle_on(press("gender_female"), today()).await;

        let sent = h.transport.take();
        assert!(documents_of(&sent).is_empty());
        assert_eq!(
            sent.last(),
            Some(&OutboundMessage::with_keyboard(
                texts::REPORT_UNAVAILABLE,
                Keyboard::MainMenu
            ))
        );
        assert_eq!(stage(&h).await, DialogueStage::Complete);
    }

    #[tokio::test]
    async fn document_delivery_failure_becomes_a_retry_later_reply() {
        let transport = RecordingTransport {
            reject_documents: true,
            ..RecordingTransport::default()
        };
        let h = harness_with(transport, false);
        complete_flow(&h).await;

        h.controller.handle_on(press("download_pdf"), today()).await;
        assert_eq!(
            h.transport.take(),
            vec![OutboundMessage::with_keyboard(
                texts::REPORT_UNAVAILABLE,
                Keyboard::MainMenu
            )]
        );
    }

    #[tokio::test]
    async fn anonymous_users_get_replies_but_nothing_is_stored() {
        let h = harness();
        h.controller
            .handle_on(text_from(None, Some(CHAT), "15.03.1990"), today())
            .await;
        assert_eq!(texts_of(&h.transport.take()), vec![texts::REQUEST_GENDER]);
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn events_without_a_chat_are_dropped() {
        let h = harness();
        h.controller
            .handle_on(text_from(Some(USER), None, "/start"), today())
            .await;
        assert!(h.transport.take().is_empty());
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn sessions_do_not_see_each_other() {
        let h = harness();
        h.controller
            .handle_on(text_from(Some(1), Some(CHAT), "15.03.1990"), today())
            .await;
        h.controller
            .handle_on(text_from(Some(2), Some(CHAT), "hello"), today())
            .await;

        let first = h
            .store
            .get(SessionKey {
                user_id: 1,
                chat_id: CHAT,
            })
            .await
            .unwrap();
        let second = h
            .store
            .get(SessionKey {
                user_id: 2,
                chat_id: CHAT,
            })
            .await
            .unwrap();
        assert_eq!(first.stage(), DialogueStage::AwaitingGender);
        assert_eq!(second, SessionState::default());
    }

    #[test]
    fn recognises_commands_and_phrases() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start@avatar_bot"));
        assert!(!is_start_command("/started"));
        assert!(is_next_phrase("ДАЛЬШЕ"));
        assert!(!is_next_phrase("дальше пожалуйста"));
    }

    #[tokio::test]
    async fn unknown_callbacks_are_only_acknowledged() {
        let h = harness();
        h.controller
            .handle_on(press("something_else"), today())
            .await;
        assert!(h.transport.take().is_empty());
        assert_eq!(h.transport.acknowledged.lock().unwrap().len(), 1);
    }
}
