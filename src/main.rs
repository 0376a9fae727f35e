// ==========================================
// 论坛讨论迁移引擎 - 命令行入口
// ==========================================
// 用法: forumx-relocation <db> <discussion_id> <target_forum_id> <user_id>
// ==========================================

use std::process::ExitCode;

use forumx_relocation::app::AppState;
use forumx_relocation::logging;

fn parse_id(name: &str, raw: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| format!("参数 {} 不是有效的ID: {}", name, raw))
}

fn run(args: &[String]) -> Result<(), String> {
    let [db_path, discussion, target, user] = args else {
        return Err(
            "用法: forumx-relocation <db> <discussion_id> <target_forum_id> <user_id>".to_string(),
        );
    };
    let discussion_id = parse_id("discussion_id", discussion)?;
    let target_forum_id = parse_id("target_forum_id", target)?;
    let user_id = parse_id("user_id", user)?;

    let state = AppState::new(db_path.clone())?;
    let api = &state.discussion_api;

    // 命令行为单次提交，令牌由本进程签发并立即消费
    let token = api.issue_session_token(user_id).map_err(|e| e.to_string())?;
    let response = api
        .move_discussion(discussion_id, target_forum_id, user_id, Some(&token))
        .map_err(|e| e.to_string())?;

    println!("{}", response.notice);
    for warning in &response.warnings {
        eprintln!("警告: {}", warning);
    }
    println!("{}", response.redirect_url);
    Ok(())
}

fn main() -> ExitCode {
    logging::init();

    tracing::info!("{} v{}", forumx_relocation::APP_NAME, forumx_relocation::VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("迁移失败: {}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
