//! Line-oriented operator console.
//!
//! Every line read from stdin is either a scan, a `:command`, or the answer
//! to an open prompt. Scan outcomes are printed as they arrive on the store's
//! event channel.

use std::sync::Arc;

use scandesk_core::events::ScanEvent;
use scandesk_core::types::{ActionId, HumanId, ScanId, ScanStatus};
use scandesk_engine::{ActionCatalog, ScanController, ScanEntry};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;

const HELP: &str = "\
Scan or type a request id to apply the current action.
  :actions       list available actions
  :action ID     switch action (clears the scan list)
  :list          show all scans, newest first
  :select N      select scan #N and show it
  :show          show the selected scan
  :help          this text
  :quit          exit
While a prompt is open the next line answers it; an empty line or :cancel dismisses it.";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan(HumanId),
    Actions,
    Action(ActionId),
    List,
    Select(ScanId),
    Show,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Parse a line typed while no prompt is open.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Scan(HumanId::new(line));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match (name, arg) {
        ("actions", "") => Command::Actions,
        ("action", "") => Command::Invalid("usage: :action ID".to_string()),
        ("action", id) => Command::Action(ActionId::new(id)),
        ("list" | "ls", "") => Command::List,
        ("select", id) => match id.parse::<ScanId>() {
            Ok(id) => Command::Select(id),
            Err(_) => Command::Invalid(format!("not a scan number: {:?}", id)),
        },
        ("show", "") => Command::Show,
        ("help" | "?", "") => Command::Help,
        ("quit" | "q" | "exit", "") => Command::Quit,
        _ => Command::Invalid(format!("unknown command: {}", line)),
    }
}

/// One-line summary of an entry for the scan list.
pub fn render_row(entry: &ScanEntry) -> String {
    let mut row = format!(
        "#{:<4} {:<14} {:<8} {}",
        entry.scan_id.0,
        entry.hrid.as_str(),
        entry.status.to_string(),
        entry.action
    );
    if let Some(request) = &entry.resolved_request {
        row.push_str(&format!(
            " {}>{}",
            request.requesting_institution_symbol.as_deref().unwrap_or("-"),
            request.supplying_institution_symbol.as_deref().unwrap_or("-")
        ));
        if let Some(title) = &request.title {
            row.push_str(&format!(" {:?}", title));
        }
    }
    match entry.status {
        ScanStatus::Success => {
            if let Some(state) = entry.resolved_request.as_ref().and_then(|r| r.state_code()) {
                row.push_str(&format!(" -> {}", state));
            }
        }
        ScanStatus::Fail => {
            if let Some(detail) = &entry.error_detail {
                row.push_str(&format!(" ({}: {})", detail.kind, detail.message));
            }
        }
        ScanStatus::Pending => {}
    }
    row
}

/// Multi-line view of an entry and its resolved request.
pub fn render_detail(entry: &ScanEntry) -> String {
    let mut lines = vec![
        format!("Scan #{}", entry.scan_id.0),
        format!("  HRID:     {}", entry.hrid),
        format!("  Action:   {}", entry.action),
        format!("  Status:   {}", entry.status),
        format!("  Scanned:  {}", entry.created_at.to_datetime().to_rfc3339()),
    ];
    if let Some(detail) = &entry.error_detail {
        lines.push(format!("  Error:    {} ({})", detail.message, detail.kind));
    }
    match &entry.resolved_request {
        Some(request) => {
            lines.push(format!("  Request:  {}", request.id));
            if let Some(title) = &request.title {
                lines.push(format!("  Title:    {}", title));
            }
            if let Some(state) = request.state_code() {
                lines.push(format!("  State:    {}", state));
            }
            if let Some(symbol) = &request.requesting_institution_symbol {
                lines.push(format!("  Requester: {}", symbol));
            }
            if let Some(symbol) = &request.supplying_institution_symbol {
                lines.push(format!("  Supplier: {}", symbol));
            }
            if !request.valid_actions.is_empty() {
                let actions: Vec<_> = request.valid_actions.iter().map(ActionId::as_str).collect();
                lines.push(format!("  Next:     {}", actions.join(", ")));
            }
        }
        None => lines.push("  Request:  (not resolved)".to_string()),
    }
    lines.join("\n")
}

/// Interactive loop over an input stream.
pub struct Console {
    controller: ScanController,
    catalog: Arc<ActionCatalog>,
}

impl Console {
    pub fn new(controller: ScanController, catalog: Arc<ActionCatalog>) -> Self {
        Self {
            controller,
            catalog,
        }
    }

    /// Run until `:quit`, end of input or Ctrl-C, then let running scans finish.
    pub async fn run<R>(&self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut events = self.controller.store().subscribe();
        let mut prompt = self.controller.prompts().subscribe();

        self.print_current_action();
        println!("Type :help for commands.");

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_line(&line).await {
                            break;
                        }
                    }
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(event) => self.on_event(&event),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "Console fell behind on store events");
                    }
                    Err(RecvError::Closed) => break,
                },
                Ok(()) = prompt.changed() => {
                    if let Some(kind) = *prompt.borrow_and_update() {
                        println!("Enter {} (empty line to cancel):", kind);
                    }
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        self.controller.prompts().dismiss();
        if self.controller.in_flight() > 0 {
            println!("Waiting for {} scan(s) to finish...", self.controller.in_flight());
        }
        // Scans still resolving can open a prompt after the dismiss above.
        loop {
            tokio::select! {
                _ = self.controller.wait_idle() => break,
                changed = prompt.changed() => {
                    if changed.is_err() {
                        self.controller.wait_idle().await;
                        break;
                    }
                    let opened = prompt.borrow_and_update().is_some();
                    if opened {
                        self.controller.prompts().dismiss();
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns `false` when the console should exit.
    async fn handle_line(&self, line: &str) -> bool {
        let prompts = self.controller.prompts();
        if prompts.pending().is_some() {
            let answer = line.trim();
            if answer.is_empty() || answer == ":cancel" {
                prompts.dismiss();
            } else if let Err(e) = prompts.resolve(answer) {
                println!("{}", e);
            }
            return true;
        }

        match parse_command(line) {
            Command::Scan(hrid) => self.scan(hrid),
            Command::Actions => self.list_actions().await,
            Command::Action(action) => self.switch_action(action).await,
            Command::List => self.list_scans(),
            Command::Select(id) => match self.controller.select(Some(id)) {
                Ok(()) => self.show_selected(),
                Err(e) => println!("{}", e),
            },
            Command::Show => self.show_selected(),
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
            Command::Empty => {}
            Command::Invalid(msg) => println!("{}", msg),
        }
        true
    }

    fn scan(&self, hrid: HumanId) {
        let Some(action) = self.controller.current_action() else {
            println!("No action selected; use :action ID");
            return;
        };
        match self.controller.submit(hrid, action) {
            Ok(id) => tracing::debug!(scan_id = %id, "Scan submitted"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to record scan");
                println!("{}", e);
            }
        }
    }

    async fn list_actions(&self) {
        let current = self.controller.current_action();
        match self.catalog.actions().await {
            Ok(actions) => {
                for action in actions {
                    let marker = if current.as_ref() == Some(&action) { '*' } else { ' ' };
                    println!("{} {}", marker, action);
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    async fn switch_action(&self, action: ActionId) {
        match self.catalog.actions().await {
            Ok(actions) if !actions.contains(&action) => {
                println!("Unknown action {}; see :actions", action);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Action catalog unavailable");
                println!("{}", e);
                return;
            }
        }
        match self.controller.set_action(action) {
            Ok(true) => self.print_current_action(),
            Ok(false) => {}
            Err(e) => println!("{}", e),
        }
    }

    fn list_scans(&self) {
        match self.controller.store().list() {
            Ok(entries) if entries.is_empty() => println!("No scans yet."),
            Ok(entries) => {
                for entry in entries {
                    println!("{}", render_row(&entry));
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    fn show_selected(&self) {
        match self.controller.store().selected_entry() {
            Ok(Some(entry)) => println!("{}", render_detail(&entry)),
            Ok(None) => println!("Nothing selected."),
            Err(e) => println!("{}", e),
        }
    }

    fn on_event(&self, event: &ScanEvent) {
        let Some(scan_id) = event.scan_id() else {
            return;
        };
        let show = match event {
            ScanEvent::ScanCreated { .. } => true,
            ScanEvent::ScanUpdated { status, .. } => status.is_terminal(),
            _ => false,
        };
        if !show {
            return;
        }
        if let Ok(entry) = self.controller.store().get(scan_id) {
            println!("{}", render_row(&entry));
        }
    }

    fn print_current_action(&self) {
        match self.controller.current_action() {
            Some(action) => println!("Action: {}", action),
            None => println!("No action selected."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scandesk_core::types::{
        ActionParams, AppSetting, ErrorKind, RecordId, RemoteRecord, Timestamp,
    };
    use scandesk_engine::{
        ActionRegistry, BackendError, ErrorDetail, PromptBroker, RequestBackend, SettingsSource,
    };
    use std::time::Duration;

    const CHECK_IN: &str = "supplierCheckInToReshare";

    /// Resolves after a delay to a record that allows the check-in action.
    struct SlowBackend;

    fn checkable(hrid: &str) -> RemoteRecord {
        RemoteRecord::new("r1")
            .with_hrid(hrid)
            .with_valid_actions([CHECK_IN])
    }

    #[async_trait]
    impl RequestBackend for SlowBackend {
        async fn find_by_hrid(&self, hrid: &HumanId) -> Result<Vec<RemoteRecord>, BackendError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(vec![checkable(hrid.as_str())])
        }

        async fn perform_action(
            &self,
            _id: &RecordId,
            _action: &ActionId,
            _params: &ActionParams,
        ) -> Result<(), BackendError> {
            Ok(())
        }

        async fn fetch(&self, _id: &RecordId) -> Result<RemoteRecord, BackendError> {
            Ok(checkable("HRID1"))
        }
    }

    #[async_trait]
    impl SettingsSource for SlowBackend {
        async fn app_settings(&self, _section: &str) -> Result<Vec<AppSetting>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn console() -> (Console, ScanController) {
        let backend = Arc::new(SlowBackend);
        let mut registry = ActionRegistry::new();
        registry.register_defaults();
        let controller = ScanController::new(
            Arc::clone(&backend) as Arc<dyn RequestBackend>,
            Arc::new(PromptBroker::new()),
            registry,
        );
        let catalog = Arc::new(ActionCatalog::with_window(
            backend as Arc<dyn SettingsSource>,
            "state_action_config",
            Duration::from_secs(600),
        ));
        (Console::new(controller.clone(), catalog), controller)
    }

    fn entry(status: ScanStatus) -> ScanEntry {
        ScanEntry {
            scan_id: ScanId(7),
            hrid: HumanId::new("HRID1"),
            action: ActionId::new("supplierMarkShipped"),
            status,
            resolved_request: None,
            error_detail: None,
            created_at: Timestamp(0),
        }
    }

    #[test]
    fn test_parse_scan_and_commands() {
        assert_eq!(parse_command("  HRID1 \r"), Command::Scan(HumanId::new("HRID1")));
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command(":actions"), Command::Actions);
        assert_eq!(
            parse_command(":action requesterReceived"),
            Command::Action(ActionId::new("requesterReceived"))
        );
        assert_eq!(parse_command(":list"), Command::List);
        assert_eq!(parse_command(":select #3"), Command::Select(ScanId(3)));
        assert_eq!(parse_command(":select 12"), Command::Select(ScanId(12)));
        assert_eq!(parse_command(":show"), Command::Show);
        assert_eq!(parse_command(":help"), Command::Help);
        assert_eq!(parse_command(":q"), Command::Quit);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(parse_command(":action"), Command::Invalid(_)));
        assert!(matches!(parse_command(":select abc"), Command::Invalid(_)));
        assert!(matches!(parse_command(":frobnicate"), Command::Invalid(_)));
        assert!(matches!(parse_command(":list now"), Command::Invalid(_)));
    }

    #[test]
    fn test_render_row_by_status() {
        let pending = render_row(&entry(ScanStatus::Pending));
        assert!(pending.starts_with("#7"));
        assert!(pending.contains("HRID1"));
        assert!(pending.contains("pending"));

        let mut done = entry(ScanStatus::Success);
        let mut request = RemoteRecord::new("r1").with_state("RES_ITEM_SHIPPED");
        request.requesting_institution_symbol = Some("RESHARE:REQ".to_string());
        request.supplying_institution_symbol = Some("RESHARE:SUP".to_string());
        request.title = Some("Middlemarch".to_string());
        done.resolved_request = Some(request);
        let row = render_row(&done);
        assert!(row.contains("RESHARE:REQ>RESHARE:SUP"));
        assert!(row.contains("\"Middlemarch\""));
        assert!(row.ends_with("-> RES_ITEM_SHIPPED"));

        let mut partial = entry(ScanStatus::Pending);
        partial.resolved_request = Some(RemoteRecord::new("r1"));
        assert!(render_row(&partial).contains(" ->-"));

        let mut failed = entry(ScanStatus::Fail);
        failed.error_detail = Some(ErrorDetail {
            kind: ErrorKind::NotFound,
            message: "No request found for HRID1".to_string(),
        });
        assert!(render_row(&failed).contains("No request found for HRID1"));
    }

    #[test]
    fn test_render_detail_includes_request() {
        let mut done = entry(ScanStatus::Success);
        let mut request = RemoteRecord::new("r1")
            .with_state("RES_ITEM_SHIPPED")
            .with_valid_actions(["supplierCheckOutOfReshare"]);
        request.title = Some("Middlemarch".to_string());
        done.resolved_request = Some(request);

        let detail = render_detail(&done);
        assert!(detail.starts_with("Scan #7"));
        assert!(detail.contains("Request:  r1"));
        assert!(detail.contains("Middlemarch"));
        assert!(detail.contains("RES_ITEM_SHIPPED"));
        assert!(detail.contains("supplierCheckOutOfReshare"));

        let bare = render_detail(&entry(ScanStatus::Pending));
        assert!(bare.contains("(not resolved)"));
    }

    #[tokio::test]
    async fn test_quit_dismisses_prompt_opened_during_shutdown() {
        let (console, controller) = console();
        controller.set_action(ActionId::new(CHECK_IN)).unwrap();

        // The scan is still resolving when :quit arrives, so its prompt
        // opens only after the console has stopped reading input.
        tokio::time::timeout(Duration::from_secs(2), console.run(&b"HRID1\n:quit\n"[..]))
            .await
            .expect("console did not exit")
            .unwrap();

        assert_eq!(controller.in_flight(), 0);
        let entries = controller.store().list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, ScanStatus::Fail);
        assert_eq!(
            entries[0].error_detail.as_ref().map(|d| d.kind),
            Some(ErrorKind::Dismissed)
        );
        assert!(controller.prompts().pending().is_none());
    }
}
