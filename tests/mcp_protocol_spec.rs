//! MCP protocol integration tests.
//!
//! These tests spawn the actual `bwk mcp` process and communicate via
//! JSON-RPC over stdio, testing the complete MCP protocol flow.
//!
//! The rmcp library uses line-delimited JSON (each message is one line):
//! ```
//! {"jsonrpc":"2.0","id":1,"method":"initialize",...}\n
//! {"jsonrpc":"2.0","id":1,"result":{...}}\n
//! ```

use boardwalk::db::Database;
use boardwalk::models::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tempfile::TempDir;

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// Ids of the rows seeded before the server starts.
struct Seed {
    board: Board,
    todo: BoardList,
    done: BoardList,
}

/// Board, two lists and a user, written straight to the database file the
/// server will open.
fn seed(path: &Path) -> Seed {
    let db = Database::open(path.to_path_buf()).expect("Failed to open database");
    db.migrate().expect("Failed to migrate");

    let board = db
        .create_board(CreateBoardInput {
            name: "Protocol Board".to_string(),
            ..Default::default()
        })
        .expect("Failed to create board");
    let todo = db
        .create_list(board.id, CreateListInput { name: "Todo".to_string(), wip_limit: None })
        .expect("Failed to create list");
    let done = db
        .create_list(board.id, CreateListInput { name: "Done".to_string(), wip_limit: None })
        .expect("Failed to create list");

    Seed { board, todo, done }
}

/// MCP test client that spawns and communicates with the server
struct McpTestClient {
    child: Child,
    request_id: u64,
    reader: BufReader<std::process::ChildStdout>,
    _temp_dir: TempDir,
}

impl McpTestClient {
    /// Spawn a new MCP server process on a freshly seeded database
    fn spawn() -> (Self, Seed) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("boardwalk.db");
        let seed = seed(&db_path);

        let mut child = Command::new(env!("CARGO_BIN_EXE_bwk"))
            .arg("mcp")
            .env("BOARDWALK_DB", &db_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn bwk mcp");

        let stdout = child.stdout.take().expect("Failed to get stdout");
        let reader = BufReader::new(stdout);

        let client = Self {
            child,
            request_id: 0,
            reader,
            _temp_dir: temp_dir,
        };
        (client, seed)
    }

    /// Send a message as line-delimited JSON
    fn send_message(&mut self, content: &str) {
        let stdin = self.child.stdin.as_mut().expect("Failed to get stdin");
        writeln!(stdin, "{}", content).expect("Failed to write message");
        stdin.flush().expect("Failed to flush stdin");
    }

    /// Read a message as line-delimited JSON
    fn read_message(&mut self) -> String {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .expect("Failed to read line");
        line.trim().to_string()
    }

    /// Send a JSON-RPC request and get the response
    fn request(&mut self, method: &str, params: Option<Value>) -> JsonRpcResponse {
        self.request_id += 1;
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id,
            method: method.to_string(),
            params,
        };

        let request_json = serde_json::to_string(&request).expect("Failed to serialize request");
        self.send_message(&request_json);

        let response_json = self.read_message();
        serde_json::from_str(&response_json).expect("Failed to parse response")
    }

    /// Send initialize request and initialized notification (required first messages)
    fn initialize(&mut self) -> JsonRpcResponse {
        let response = self.request(
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "test-client",
                    "version": "1.0.0"
                }
            })),
        );

        let notification = json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        });
        self.send_message(&notification.to_string());

        response
    }

    fn list_tools(&mut self) -> JsonRpcResponse {
        self.request("tools/list", None)
    }

    fn call_tool(&mut self, name: &str, arguments: Value) -> JsonRpcResponse {
        self.request(
            "tools/call",
            Some(json!({
                "name": name,
                "arguments": arguments
            })),
        )
    }
}

impl Drop for McpTestClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Parse the JSON carried in the first text content of a tool result.
fn extract_json(response: &JsonRpcResponse) -> Value {
    let result = response.result.as_ref().expect("Expected result");
    let text = result
        .get("content")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
        .expect("Expected text content");
    serde_json::from_str(text).expect("Expected JSON in text")
}

// ============================================================
// Protocol Tests
// ============================================================

mod protocol {
    use super::*;

    #[test]
    fn initialize_returns_server_info() {
        let (mut client, _) = McpTestClient::spawn();
        let response = client.initialize();

        assert!(response.error.is_none(), "Expected success, got error");
        let result = response.result.expect("Expected result");

        let server_info = result.get("serverInfo").expect("Expected serverInfo");
        assert_eq!(
            server_info.get("name").and_then(|n| n.as_str()),
            Some("boardwalk")
        );
        assert!(result.get("capabilities").is_some());
    }

    #[test]
    fn tools_list_returns_all_tools() {
        let (mut client, _) = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        assert!(response.error.is_none(), "Expected success, got error");

        let result = response.result.expect("Expected result");
        let tools_array = result
            .get("tools")
            .and_then(|t| t.as_array())
            .expect("Tools should be array");

        assert_eq!(
            tools_array.len(),
            11,
            "Expected 11 tools, got {}",
            tools_array.len()
        );

        let tool_names: Vec<&str> = tools_array
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();

        for name in [
            "list_boards",
            "get_board",
            "create_card",
            "move_card",
            "update_card_status",
            "add_checklist_item",
            "toggle_checklist_item",
            "add_comment",
            "get_card_activity",
            "board_dashboard",
            "sprint_burndown",
        ] {
            assert!(tool_names.contains(&name), "Missing tool {}", name);
        }
    }

    #[test]
    fn tools_have_descriptions_and_schemas() {
        let (mut client, _) = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        let result = response.result.expect("Expected result");
        let tools = result
            .get("tools")
            .and_then(|t| t.as_array())
            .expect("Tools should be array");

        for tool in tools {
            let name = tool.get("name").and_then(|n| n.as_str()).unwrap_or("?");
            assert!(
                tool.get("description").is_some(),
                "Tool {} missing description",
                name
            );
            assert!(
                tool.get("inputSchema").is_some(),
                "Tool {} missing inputSchema",
                name
            );
        }
    }
}

// ============================================================
// Tool Call Tests
// ============================================================

mod tool_calls {
    use super::*;

    #[test]
    fn list_boards_sees_seeded_board() {
        let (mut client, seed) = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("list_boards", json!({}));

        assert!(response.error.is_none(), "Expected success, got error");
        let boards = extract_json(&response);
        let boards = boards.as_array().expect("Expected array");
        assert_eq!(boards.len(), 1);
        assert_eq!(
            boards[0].get("id").and_then(|v| v.as_str()),
            Some(seed.board.id.to_string().as_str())
        );
    }

    #[test]
    fn create_move_and_inspect_a_card() {
        let (mut client, seed) = McpTestClient::spawn();
        client.initialize();

        let created = client.call_tool(
            "create_card",
            json!({
                "list_id": seed.todo.id.to_string(),
                "title": "From an agent",
                "priority": "high",
                "story_points": 3
            }),
        );
        assert!(created.error.is_none(), "Expected success, got error");
        let card = extract_json(&created);
        let card_id = card.get("id").and_then(|v| v.as_str()).expect("Card id").to_string();
        assert_eq!(card.get("priority").and_then(|v| v.as_str()), Some("high"));

        let moved = client.call_tool(
            "move_card",
            json!({ "card_id": card_id, "list_id": seed.done.id.to_string() }),
        );
        assert!(moved.error.is_none(), "Expected success, got error");

        let board = extract_json(&client.call_tool(
            "get_board",
            json!({ "board_id": seed.board.id.to_string() }),
        ));
        let lists = board.get("lists").and_then(|l| l.as_array()).expect("Lists");
        let done_cards = lists[1].get("cards").and_then(|c| c.as_array()).expect("Cards");
        assert_eq!(done_cards.len(), 1);
        assert_eq!(
            done_cards[0].get("title").and_then(|v| v.as_str()),
            Some("From an agent")
        );

        let activity = extract_json(&client.call_tool(
            "get_card_activity",
            json!({ "card_id": card_id }),
        ));
        let actions: Vec<&str> = activity
            .as_array()
            .expect("Expected array")
            .iter()
            .filter_map(|a| a.get("action").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(actions, vec!["moved", "created"]);
    }

    #[test]
    fn checklist_toggle_round_trip() {
        let (mut client, seed) = McpTestClient::spawn();
        client.initialize();

        let card = extract_json(&client.call_tool(
            "create_card",
            json!({ "list_id": seed.todo.id.to_string(), "title": "Has steps" }),
        ));
        let card_id = card.get("id").and_then(|v| v.as_str()).expect("Card id").to_string();

        let item = extract_json(&client.call_tool(
            "add_checklist_item",
            json!({ "card_id": card_id, "content": "First step" }),
        ));
        let item_id = item.get("id").and_then(|v| v.as_str()).expect("Item id").to_string();

        let toggled = extract_json(&client.call_tool(
            "toggle_checklist_item",
            json!({ "item_id": item_id }),
        ));
        assert_eq!(toggled.get("is_completed").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn dashboard_returns_board_stats() {
        let (mut client, seed) = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool(
            "board_dashboard",
            json!({ "board_id": seed.board.id.to_string(), "as_of": "2030-06-01" }),
        );

        assert!(response.error.is_none(), "Expected success, got error");
        let dashboard = extract_json(&response);
        let stats = dashboard.get("stats").expect("Expected stats");
        assert_eq!(stats.get("total_cards").and_then(|v| v.as_i64()), Some(0));
        assert_eq!(stats.get("as_of").and_then(|v| v.as_str()), Some("2030-06-01"));
    }

    #[test]
    fn invalid_uuid_is_an_error() {
        let (mut client, _) = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("get_board", json!({ "board_id": "not-a-uuid" }));

        assert!(response.error.is_some(), "Expected error for invalid UUID");
    }

    #[test]
    fn unknown_status_is_an_error() {
        let (mut client, seed) = McpTestClient::spawn();
        client.initialize();

        let card = extract_json(&client.call_tool(
            "create_card",
            json!({ "list_id": seed.todo.id.to_string(), "title": "Status test" }),
        ));
        let card_id = card.get("id").and_then(|v| v.as_str()).expect("Card id").to_string();

        let response = client.call_tool(
            "update_card_status",
            json!({ "card_id": card_id, "status": "shipped" }),
        );

        assert!(response.error.is_some(), "Expected error for unknown status");
    }
}
