use askama::Template;
use bb_core::{BoardData, BoardDescription};

const LOADING_TAGLINE: &str = "loading...";
/// Accent used until the board's own color is known.
pub const DEFAULT_ACCENT: &str = "#f96680";

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Text(String),
    Categories(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarSection {
    pub title: String,
    pub body: SectionBody,
}

#[derive(Template, Debug, Clone, PartialEq)]
#[template(path = "sidebar.html")]
pub struct BoardSidebarView {
    pub slug: String,
    pub avatar_url: String,
    pub tagline: String,
    pub accent_color: String,
    pub sections: Vec<SidebarSection>,
}

impl BoardSidebarView {
    /// Placeholder shown while the board list is loading.
    pub fn loading(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            avatar_url: "/".to_string(),
            tagline: LOADING_TAGLINE.to_string(),
            accent_color: DEFAULT_ACCENT.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn from_board(board: &BoardData) -> Self {
        let mut descriptions: Vec<&BoardDescription> = board.descriptions.iter().collect();
        descriptions.sort_by_key(|description| description.index());

        Self {
            slug: board.slug.clone(),
            avatar_url: board.avatar_url.clone(),
            tagline: board.tagline.clone(),
            accent_color: board
                .accent_color
                .clone()
                .unwrap_or_else(|| DEFAULT_ACCENT.to_string()),
            sections: descriptions
                .into_iter()
                .map(|description| SidebarSection {
                    title: description.title().to_string(),
                    body: match description {
                        BoardDescription::Text { description, .. } => SectionBody::Text(description.clone()),
                        BoardDescription::CategoryFilter { categories, .. } => {
                            SectionBody::Categories(categories.clone())
                        }
                    },
                })
                .collect(),
        }
    }

    /// Sidebar for `slug` from the cached board list, or the placeholder.
    pub fn for_slug(slug: &str, boards: &[BoardData]) -> Self {
        boards
            .iter()
            .find(|board| board.slug == slug)
            .map(Self::from_board)
            .unwrap_or_else(|| Self::loading(slug))
    }
}
