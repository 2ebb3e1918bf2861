//! MCP server that lets agents read and work boards over stdio.
//!
//! Each tool parses its string arguments, calls the same [`Database`] the HTTP
//! API uses and returns the result as pretty-printed JSON text. The
//! `handle_*` methods hold the tool logic and are public so it can be
//! exercised without a transport.

mod types;

use std::str::FromStr;

pub use types::*;

use chrono::{NaiveDate, Utc};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{Database, StoreError};
use crate::models::*;

#[derive(Clone)]
pub struct McpServer {
    db: Database,
    tool_router: ToolRouter<Self>,
}

fn parse_uuid(s: &str) -> Result<Uuid, McpError> {
    Uuid::parse_str(s.trim())
        .map_err(|e| McpError::invalid_params(format!("Invalid UUID '{}': {}", s, e), None))
}

fn parse_actor(s: Option<String>) -> Result<Option<Uuid>, McpError> {
    s.as_deref().map(parse_uuid).transpose()
}

fn parse_date(s: &str) -> Result<NaiveDate, McpError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        McpError::invalid_params(format!("Invalid date '{}', expected YYYY-MM-DD", s), None)
    })
}

fn as_of(s: Option<String>) -> Result<NaiveDate, McpError> {
    match s {
        Some(s) => parse_date(&s),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Domain errors are the caller's problem; everything else is ours.
fn store_error(e: anyhow::Error) -> McpError {
    match e.downcast_ref::<StoreError>() {
        Some(err) => McpError::invalid_params(err.to_string(), None),
        None => {
            tracing::error!("MCP tool failed: {:#}", e);
            McpError::internal_error(e.to_string(), None)
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

impl McpServer {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    pub fn handle_list_boards(&self, req: ListBoardsRequest) -> Result<Vec<BoardSummary>, McpError> {
        let boards = self
            .db
            .get_all_boards(req.include_archived)
            .map_err(store_error)?;
        Ok(boards.into_iter().map(BoardSummary::from).collect())
    }

    pub fn handle_get_board(&self, req: GetBoardRequest) -> Result<BoardOverview, McpError> {
        let board_id = parse_uuid(&req.board_id)?;
        self.db
            .get_board_detail(board_id)
            .map_err(store_error)?
            .map(BoardOverview::from)
            .ok_or_else(|| McpError::invalid_params("Board not found", None))
    }

    pub fn handle_create_card(&self, req: CreateCardRequest) -> Result<Card, McpError> {
        let list_id = parse_uuid(&req.list_id)?;
        let priority = req
            .priority
            .as_deref()
            .map(CardPriority::from_str)
            .transpose()
            .map_err(|e| McpError::invalid_params(e, None))?;
        let due_date = req.due_date.as_deref().map(parse_date).transpose()?;
        let actor = parse_actor(req.actor_id)?;

        self.db
            .create_card(
                list_id,
                CreateCardInput {
                    title: req.title,
                    description: req.description,
                    status: None,
                    priority,
                    story_points: req.story_points,
                    due_date,
                    sprint_id: None,
                },
                actor,
            )
            .map_err(store_error)
    }

    pub fn handle_move_card(&self, req: MoveCardRequest) -> Result<Card, McpError> {
        let card_id = parse_uuid(&req.card_id)?;
        let list_id = parse_uuid(&req.list_id)?;
        let actor = parse_actor(req.actor_id)?;

        self.db
            .move_card(
                card_id,
                MoveCardInput {
                    list_id,
                    position: req.position,
                },
                actor,
            )
            .map_err(store_error)?
            .ok_or_else(|| McpError::invalid_params("Card not found", None))
    }

    pub fn handle_update_card_status(&self, req: UpdateCardStatusRequest) -> Result<Card, McpError> {
        let card_id = parse_uuid(&req.card_id)?;
        let status =
            CardStatus::from_str(&req.status).map_err(|e| McpError::invalid_params(e, None))?;
        let actor = parse_actor(req.actor_id)?;

        self.db
            .update_card(
                card_id,
                UpdateCardInput {
                    status: Some(status),
                    ..Default::default()
                },
                actor,
            )
            .map_err(store_error)?
            .ok_or_else(|| McpError::invalid_params("Card not found", None))
    }

    pub fn handle_add_checklist_item(
        &self,
        req: AddChecklistItemRequest,
    ) -> Result<ChecklistItem, McpError> {
        let card_id = parse_uuid(&req.card_id)?;
        let actor = parse_actor(req.actor_id)?;
        self.db
            .create_checklist_item(
                card_id,
                CreateChecklistItemInput {
                    content: req.content,
                },
                actor,
            )
            .map_err(store_error)
    }

    pub fn handle_toggle_checklist_item(
        &self,
        req: ToggleChecklistItemRequest,
    ) -> Result<ChecklistItem, McpError> {
        let item_id = parse_uuid(&req.item_id)?;
        let actor = parse_actor(req.actor_id)?;

        let completed = match req.completed {
            Some(completed) => completed,
            None => {
                let item = self
                    .db
                    .get_checklist_item(item_id)
                    .map_err(store_error)?
                    .ok_or_else(|| McpError::invalid_params("Checklist item not found", None))?;
                !item.is_completed
            }
        };

        self.db
            .update_checklist_item(
                item_id,
                UpdateChecklistItemInput {
                    content: None,
                    is_completed: Some(completed),
                },
                actor,
            )
            .map_err(store_error)?
            .ok_or_else(|| McpError::invalid_params("Checklist item not found", None))
    }

    pub fn handle_add_comment(&self, req: AddCommentRequest) -> Result<Comment, McpError> {
        let card_id = parse_uuid(&req.card_id)?;
        let author = parse_actor(req.author_id)?;
        self.db
            .create_comment(card_id, CommentInput { body: req.body }, author)
            .map_err(store_error)
    }

    pub fn handle_get_card_activity(
        &self,
        req: GetCardActivityRequest,
    ) -> Result<Vec<CardActivity>, McpError> {
        let card_id = parse_uuid(&req.card_id)?;
        self.db
            .get_card_activity(
                card_id,
                &ActivityQuery {
                    limit: req.limit,
                    offset: None,
                },
            )
            .map_err(store_error)
    }

    pub fn handle_board_dashboard(&self, req: BoardDashboardRequest) -> Result<Dashboard, McpError> {
        let board_id = parse_uuid(&req.board_id)?;
        let as_of = as_of(req.as_of)?;
        self.db
            .dashboard(board_id, as_of)
            .map_err(store_error)?
            .ok_or_else(|| McpError::invalid_params("Board not found", None))
    }

    pub fn handle_sprint_burndown(&self, req: SprintBurndownRequest) -> Result<Burndown, McpError> {
        let sprint_id = parse_uuid(&req.sprint_id)?;
        let as_of = as_of(req.as_of)?;
        self.db
            .burndown(sprint_id, as_of)
            .map_err(store_error)?
            .ok_or_else(|| McpError::invalid_params("Sprint not found", None))
    }
}

#[tool_router]
impl McpServer {
    #[tool(description = "List boards by name. Returns id, name, description and archived flag for each.")]
    async fn list_boards(
        &self,
        params: Parameters<ListBoardsRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_list_boards(params.0)?)
    }

    #[tool(
        description = "Get a board laid out as ordered lists, each with its ordered cards (id, title, status, priority, story points, due date). Call this before moving or creating cards to learn list and card ids."
    )]
    async fn get_board(
        &self,
        params: Parameters<GetBoardRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_get_board(params.0)?)
    }

    #[tool(description = "Create a card at the end of a list. Records a 'created' activity entry.")]
    async fn create_card(
        &self,
        params: Parameters<CreateCardRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_create_card(params.0)?)
    }

    #[tool(
        description = "Move a card to a list on the same board, optionally at a position. Fails if the destination list is at its WIP limit."
    )]
    async fn move_card(
        &self,
        params: Parameters<MoveCardRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_move_card(params.0)?)
    }

    #[tool(
        description = "Set a card's status. Moving to 'done' stamps completed_at, which feeds burndown, velocity and productivity reports."
    )]
    async fn update_card_status(
        &self,
        params: Parameters<UpdateCardStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_update_card_status(params.0)?)
    }

    #[tool(description = "Append an item to a card's checklist.")]
    async fn add_checklist_item(
        &self,
        params: Parameters<AddChecklistItemRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_add_checklist_item(params.0)?)
    }

    #[tool(description = "Mark a checklist item complete or incomplete, or flip it if no state is given.")]
    async fn toggle_checklist_item(
        &self,
        params: Parameters<ToggleChecklistItemRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_toggle_checklist_item(params.0)?)
    }

    #[tool(description = "Add a comment to a card.")]
    async fn add_comment(
        &self,
        params: Parameters<AddCommentRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_add_comment(params.0)?)
    }

    #[tool(description = "Read a card's activity history, newest first.")]
    async fn get_card_activity(
        &self,
        params: Parameters<GetCardActivityRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_get_card_activity(params.0)?)
    }

    #[tool(
        description = "Board dashboard: totals by status and priority, the last four weekly rollups, the active sprint's burndown, recent activity and cards due within a week."
    )]
    async fn board_dashboard(
        &self,
        params: Parameters<BoardDashboardRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_board_dashboard(params.0)?)
    }

    #[tool(
        description = "Daily burndown for a sprint: ideal remaining points against actual remaining points and cards. Days after as_of have null actuals."
    )]
    async fn sprint_burndown(
        &self,
        params: Parameters<SprintBurndownRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.handle_sprint_burndown(params.0)?)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "boardwalk".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"Boardwalk holds project boards: ordered lists of ordered cards, with checklists, comments and an activity history.

WORKFLOW:
1. list_boards to find a board, then get_board for its lists and cards.
2. create_card / move_card / update_card_status to work the board.
3. add_checklist_item / toggle_checklist_item to track sub-steps.
4. add_comment to leave notes; get_card_activity to see what happened to a card.

REPORTING:
- board_dashboard summarizes progress, workload and upcoming due dates.
- sprint_burndown shows whether a sprint is on track.

Pass actor_id (a user UUID) on mutations so the activity log records who acted.
Dates are YYYY-MM-DD."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(db: Database) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(db);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
