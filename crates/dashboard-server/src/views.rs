//! View Routes
//!
//! The navigation menu: which pages exist and what each one calls.

use std::fmt;
use std::str::FromStr;

use axum::{extract::Path, routing::get, Json, Router};
use maven_core::ValidationError;
use serde::Serialize;

use crate::{ApiResponse, AppError, AppState};

pub const MENU_TITLE: &str = "Finance";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    StockDashboard,
    ChatBot,
    VisionBot,
}

impl View {
    pub const ALL: [View; 3] = [View::StockDashboard, View::ChatBot, View::VisionBot];

    pub fn slug(&self) -> &'static str {
        match self {
            View::StockDashboard => "dashboard",
            View::ChatBot => "chat",
            View::VisionBot => "vision",
        }
    }

    /// Menu entry label
    pub fn label(&self) -> &'static str {
        match self {
            View::StockDashboard => "Stock Dashboard",
            View::ChatBot => "ChatBot",
            View::VisionBot => "VisionBot",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            View::StockDashboard => "graph-up",
            View::ChatBot => "robot",
            View::VisionBot => "eye",
        }
    }

    /// Page heading
    pub fn title(&self) -> &'static str {
        match self {
            View::StockDashboard => "Stock Dashboard",
            View::ChatBot => "Chat with Money Maven Bot",
            View::VisionBot => "VisionBot Analysis",
        }
    }

    pub fn endpoints(&self) -> &'static [&'static str] {
        match self {
            View::StockDashboard => &[
                "GET /api/dashboard/:symbol",
                "GET /api/watchlist",
                "POST /api/watchlist",
                "DELETE /api/watchlist/:symbol",
            ],
            View::ChatBot => &["GET /api/chat", "POST /api/chat", "DELETE /api/chat"],
            View::VisionBot => &["POST /api/vision"],
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for View {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        View::ALL
            .into_iter()
            .find(|v| v.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::Other(format!("Unknown view '{}'", wanted)))
    }
}

#[derive(Serialize)]
pub struct MenuEntry {
    pub view: View,
    pub slug: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub is_default: bool,
}

#[derive(Serialize)]
pub struct Menu {
    pub title: &'static str,
    pub entries: Vec<MenuEntry>,
}

#[derive(Serialize)]
pub struct ViewDetail {
    pub view: View,
    pub title: &'static str,
    pub endpoints: &'static [&'static str],
}

pub fn menu() -> Menu {
    Menu {
        title: MENU_TITLE,
        entries: View::ALL
            .into_iter()
            .map(|view| MenuEntry {
                view,
                slug: view.slug(),
                label: view.label(),
                icon: view.icon(),
                is_default: view == View::default(),
            })
            .collect(),
    }
}

pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/api/views", get(get_menu))
        .route("/api/views/:view", get(get_view))
}

async fn get_menu() -> Json<ApiResponse<Menu>> {
    Json(ApiResponse::success(menu()))
}

async fn get_view(Path(slug): Path<String>) -> Result<Json<ApiResponse<ViewDetail>>, AppError> {
    let view: View = slug.parse().map_err(AppError::bad_request)?;
    Ok(Json(ApiResponse::success(ViewDetail {
        view,
        title: view.title(),
        endpoints: view.endpoints(),
    })))
}
