//! MCP tool integration tests.
//!
//! Each tool is driven through its `handle_*` method against an in-memory
//! database, so no transport is involved.

use boardwalk::db::Database;
use boardwalk::mcp::*;
use boardwalk::models::*;
use chrono::{Duration, Utc};

/// Helper to create a test MCP server with in-memory database.
fn setup() -> (McpServer, Database) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let server = McpServer::new(db.clone());
    (server, db)
}

/// A board with "Todo" and "Done" lists.
fn create_test_board(db: &Database) -> (Board, BoardList, BoardList) {
    let board = db
        .create_board(CreateBoardInput {
            name: "Agent Board".to_string(),
            ..Default::default()
        })
        .expect("Failed to create board");
    let todo = db
        .create_list(board.id, CreateListInput { name: "Todo".to_string(), wip_limit: None })
        .expect("Failed to create list");
    let done = db
        .create_list(board.id, CreateListInput { name: "Done".to_string(), wip_limit: None })
        .expect("Failed to create list");
    (board, todo, done)
}

fn create_test_card(server: &McpServer, list_id: uuid::Uuid, title: &str) -> Card {
    server
        .handle_create_card(CreateCardRequest {
            list_id: list_id.to_string(),
            title: title.to_string(),
            description: None,
            priority: None,
            story_points: None,
            due_date: None,
            actor_id: None,
        })
        .expect("Failed to create card")
}

// ============================================================
// Board Tools
// ============================================================

mod board_tools {
    use super::*;

    mod list_boards {
        use super::*;

        #[test]
        fn returns_summaries_without_archived_boards() {
            let (server, db) = setup();
            let (board, _, _) = create_test_board(&db);
            let archived = db
                .create_board(CreateBoardInput { name: "Old".to_string(), ..Default::default() })
                .unwrap();
            db.update_board(archived.id, UpdateBoardInput { archived: Some(true), ..Default::default() })
                .unwrap();

            let boards = server.handle_list_boards(ListBoardsRequest::default()).unwrap();
            assert_eq!(boards.len(), 1);
            assert_eq!(boards[0].id, board.id.to_string());

            let all = server
                .handle_list_boards(ListBoardsRequest { include_archived: true })
                .unwrap();
            assert_eq!(all.len(), 2);
        }
    }

    mod get_board {
        use super::*;

        #[test]
        fn lays_out_lists_and_cards() {
            let (server, db) = setup();
            let (board, todo, _) = create_test_board(&db);
            create_test_card(&server, todo.id, "First");

            let overview = server
                .handle_get_board(GetBoardRequest { board_id: board.id.to_string() })
                .unwrap();

            assert_eq!(overview.name, "Agent Board");
            assert_eq!(overview.lists.len(), 2);
            assert_eq!(overview.lists[0].name, "Todo");
            assert_eq!(overview.lists[0].cards[0].title, "First");
            assert_eq!(overview.lists[0].cards[0].priority, "medium");
            assert!(overview.lists[1].cards.is_empty());
        }

        #[test]
        fn fails_for_a_malformed_id() {
            let (server, _) = setup();

            let result = server.handle_get_board(GetBoardRequest { board_id: "nope".to_string() });

            assert!(result.is_err());
        }

        #[test]
        fn fails_for_a_missing_board() {
            let (server, _) = setup();

            let result = server.handle_get_board(GetBoardRequest {
                board_id: uuid::Uuid::new_v4().to_string(),
            });

            assert!(result.is_err());
        }
    }

    mod board_dashboard {
        use super::*;

        #[test]
        fn reports_stats_as_of_a_given_day() {
            let (server, db) = setup();
            let (board, todo, _) = create_test_board(&db);
            create_test_card(&server, todo.id, "Counted");

            let dashboard = server
                .handle_board_dashboard(BoardDashboardRequest {
                    board_id: board.id.to_string(),
                    as_of: Some("2030-01-15".to_string()),
                })
                .unwrap();

            assert_eq!(dashboard.stats.as_of.to_string(), "2030-01-15");
            assert_eq!(dashboard.stats.total_cards, 1);
            assert_eq!(dashboard.weekly.len(), 4);
        }

        #[test]
        fn rejects_a_malformed_date() {
            let (server, db) = setup();
            let (board, _, _) = create_test_board(&db);

            let result = server.handle_board_dashboard(BoardDashboardRequest {
                board_id: board.id.to_string(),
                as_of: Some("15/01/2030".to_string()),
            });

            assert!(result.is_err());
        }

        #[test]
        fn rejects_a_day_past_the_calendar_and_keeps_working() {
            let (server, db) = setup();
            let (board, _, _) = create_test_board(&db);

            let result = server.handle_board_dashboard(BoardDashboardRequest {
                board_id: board.id.to_string(),
                as_of: Some("+262142-12-31".to_string()),
            });
            assert!(result.is_err());

            let dashboard = server
                .handle_board_dashboard(BoardDashboardRequest {
                    board_id: board.id.to_string(),
                    as_of: None,
                })
                .unwrap();
            assert_eq!(dashboard.board.id, board.id);
        }
    }
}

// ============================================================
// Card Tools
// ============================================================

mod card_tools {
    use super::*;

    mod create_card {
        use super::*;

        #[test]
        fn parses_priority_and_due_date() {
            let (server, db) = setup();
            let (_, todo, _) = create_test_board(&db);

            let card = server
                .handle_create_card(CreateCardRequest {
                    list_id: todo.id.to_string(),
                    title: "Urgent fix".to_string(),
                    description: Some("Production is down".to_string()),
                    priority: Some("urgent".to_string()),
                    story_points: Some(3),
                    due_date: Some("2030-02-01".to_string()),
                    actor_id: None,
                })
                .unwrap();

            assert_eq!(card.priority, CardPriority::Urgent);
            assert_eq!(card.story_points, Some(3));
            assert_eq!(card.due_date.map(|d| d.to_string()).as_deref(), Some("2030-02-01"));
        }

        #[test]
        fn rejects_an_unknown_priority() {
            let (server, db) = setup();
            let (_, todo, _) = create_test_board(&db);

            let result = server.handle_create_card(CreateCardRequest {
                list_id: todo.id.to_string(),
                title: "Card".to_string(),
                description: None,
                priority: Some("critical".to_string()),
                story_points: None,
                due_date: None,
                actor_id: None,
            });

            assert!(result.is_err());
        }

        #[test]
        fn records_the_actor() {
            let (server, db) = setup();
            let (_, todo, _) = create_test_board(&db);
            let agent = db
                .create_user(CreateUserInput {
                    name: "Agent".to_string(),
                    email: "agent@example.com".to_string(),
                })
                .unwrap();

            let card = server
                .handle_create_card(CreateCardRequest {
                    list_id: todo.id.to_string(),
                    title: "By agent".to_string(),
                    description: None,
                    priority: None,
                    story_points: None,
                    due_date: None,
                    actor_id: Some(agent.id.to_string()),
                })
                .unwrap();

            assert_eq!(card.created_by, Some(agent.id));
        }
    }

    mod move_card {
        use super::*;

        #[test]
        fn moves_to_another_list() {
            let (server, db) = setup();
            let (_, todo, done) = create_test_board(&db);
            let card = create_test_card(&server, todo.id, "Mover");

            let moved = server
                .handle_move_card(MoveCardRequest {
                    card_id: card.id.to_string(),
                    list_id: done.id.to_string(),
                    position: None,
                    actor_id: None,
                })
                .unwrap();

            assert_eq!(moved.list_id, done.id);
            assert!(db.get_cards_by_list(todo.id).unwrap().is_empty());
        }

        #[test]
        fn fails_when_the_wip_limit_is_reached() {
            let (server, db) = setup();
            let (_, todo, done) = create_test_board(&db);
            db.update_list(done.id, UpdateListInput { name: None, wip_limit: Some(Some(1)) })
                .unwrap();
            create_test_card(&server, done.id, "Already there");
            let card = create_test_card(&server, todo.id, "Blocked");

            let result = server.handle_move_card(MoveCardRequest {
                card_id: card.id.to_string(),
                list_id: done.id.to_string(),
                position: None,
                actor_id: None,
            });

            assert!(result.is_err());
            assert_eq!(db.get_card(card.id).unwrap().unwrap().list_id, todo.id);
        }

        #[test]
        fn fails_for_a_missing_card() {
            let (server, db) = setup();
            let (_, todo, _) = create_test_board(&db);

            let result = server.handle_move_card(MoveCardRequest {
                card_id: uuid::Uuid::new_v4().to_string(),
                list_id: todo.id.to_string(),
                position: None,
                actor_id: None,
            });

            assert!(result.is_err());
        }
    }

    mod update_card_status {
        use super::*;

        #[test]
        fn marks_a_card_done() {
            let (server, db) = setup();
            let (_, todo, _) = create_test_board(&db);
            let card = create_test_card(&server, todo.id, "Finish me");

            let updated = server
                .handle_update_card_status(UpdateCardStatusRequest {
                    card_id: card.id.to_string(),
                    status: "done".to_string(),
                    actor_id: None,
                })
                .unwrap();

            assert_eq!(updated.status, CardStatus::Done);
            assert!(updated.completed_at.is_some());
        }

        #[test]
        fn rejects_an_unknown_status() {
            let (server, db) = setup();
            let (_, todo, _) = create_test_board(&db);
            let card = create_test_card(&server, todo.id, "Card");

            let result = server.handle_update_card_status(UpdateCardStatusRequest {
                card_id: card.id.to_string(),
                status: "shipped".to_string(),
                actor_id: None,
            });

            assert!(result.is_err());
        }
    }

    mod get_card_activity {
        use super::*;

        #[test]
        fn returns_newest_first_within_limit() {
            let (server, db) = setup();
            let (_, todo, done) = create_test_board(&db);
            let card = create_test_card(&server, todo.id, "Tracked");
            server
                .handle_move_card(MoveCardRequest {
                    card_id: card.id.to_string(),
                    list_id: done.id.to_string(),
                    position: None,
                    actor_id: None,
                })
                .unwrap();

            let activity = server
                .handle_get_card_activity(GetCardActivityRequest {
                    card_id: card.id.to_string(),
                    limit: Some(1),
                })
                .unwrap();

            assert_eq!(activity.len(), 1);
            assert_eq!(activity[0].action, ActivityAction::Moved);
        }
    }
}

// ============================================================
// Checklist and Comment Tools
// ============================================================

mod checklist_tools {
    use super::*;

    #[test]
    fn toggles_an_item_back_and_forth() {
        let (server, db) = setup();
        let (_, todo, _) = create_test_board(&db);
        let card = create_test_card(&server, todo.id, "With steps");

        let item = server
            .handle_add_checklist_item(AddChecklistItemRequest {
                card_id: card.id.to_string(),
                content: "Write tests".to_string(),
                actor_id: None,
            })
            .unwrap();
        assert!(!item.is_completed);

        let flipped = server
            .handle_toggle_checklist_item(ToggleChecklistItemRequest {
                item_id: item.id.to_string(),
                completed: None,
                actor_id: None,
            })
            .unwrap();
        assert!(flipped.is_completed);

        let flipped_back = server
            .handle_toggle_checklist_item(ToggleChecklistItemRequest {
                item_id: item.id.to_string(),
                completed: None,
                actor_id: None,
            })
            .unwrap();
        assert!(!flipped_back.is_completed);
    }

    #[test]
    fn sets_an_explicit_state() {
        let (server, db) = setup();
        let (_, todo, _) = create_test_board(&db);
        let card = create_test_card(&server, todo.id, "With steps");
        let item = server
            .handle_add_checklist_item(AddChecklistItemRequest {
                card_id: card.id.to_string(),
                content: "Ship".to_string(),
                actor_id: None,
            })
            .unwrap();

        for _ in 0..2 {
            let item = server
                .handle_toggle_checklist_item(ToggleChecklistItemRequest {
                    item_id: item.id.to_string(),
                    completed: Some(true),
                    actor_id: None,
                })
                .unwrap();
            assert!(item.is_completed);
        }
    }

    #[test]
    fn toggling_a_missing_item_fails() {
        let (server, _) = setup();

        let result = server.handle_toggle_checklist_item(ToggleChecklistItemRequest {
            item_id: uuid::Uuid::new_v4().to_string(),
            completed: None,
            actor_id: None,
        });

        assert!(result.is_err());
    }

    #[test]
    fn adds_a_comment_with_author() {
        let (server, db) = setup();
        let (_, todo, _) = create_test_board(&db);
        let card = create_test_card(&server, todo.id, "Discussed");
        let author = db
            .create_user(CreateUserInput {
                name: "Reviewer".to_string(),
                email: "reviewer@example.com".to_string(),
            })
            .unwrap();

        let comment = server
            .handle_add_comment(AddCommentRequest {
                card_id: card.id.to_string(),
                body: "Ready for review".to_string(),
                author_id: Some(author.id.to_string()),
            })
            .unwrap();

        assert_eq!(comment.author_id, Some(author.id));
        assert_eq!(db.get_comments(card.id).unwrap().len(), 1);
    }
}

// ============================================================
// Sprint Tools
// ============================================================

mod sprint_tools {
    use super::*;

    #[test]
    fn burns_down_the_sprint() {
        let (server, db) = setup();
        let (board, todo, _) = create_test_board(&db);
        let today = Utc::now().date_naive();
        let sprint = db
            .create_sprint(
                board.id,
                CreateSprintInput {
                    name: "Now".to_string(),
                    start_date: today - Duration::days(1),
                    end_date: today + Duration::days(1),
                    status: Some(SprintStatus::Active),
                    ..Default::default()
                },
            )
            .unwrap();
        db.create_card(
            todo.id,
            CreateCardInput {
                title: "Committed".to_string(),
                story_points: Some(2),
                sprint_id: Some(sprint.id),
                ..Default::default()
            },
            None,
        )
        .unwrap();

        let burndown = server
            .handle_sprint_burndown(SprintBurndownRequest {
                sprint_id: sprint.id.to_string(),
                as_of: None,
            })
            .unwrap();

        assert_eq!(burndown.total_points, 2);
        assert_eq!(burndown.days.len(), 3);
        assert_eq!(burndown.days[1].remaining_points, Some(2));
        assert_eq!(burndown.days[2].remaining_points, None);
    }

    #[test]
    fn fails_for_a_missing_sprint() {
        let (server, _) = setup();

        let result = server.handle_sprint_burndown(SprintBurndownRequest {
            sprint_id: uuid::Uuid::new_v4().to_string(),
            as_of: None,
        });

        assert!(result.is_err());
    }
}
