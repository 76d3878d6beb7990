use askama::Template;
use bb_core::BoardData;

#[derive(Debug, Clone, PartialEq)]
pub struct BoardTile {
    /// Slug as displayed, underscores shown as spaces.
    pub name: String,
    pub avatar: String,
    pub description: String,
    pub color: Option<String>,
    pub updates: bool,
    pub link: String,
}

impl BoardTile {
    pub fn from_board(board: &BoardData) -> Self {
        Self {
            name: board.slug.replace('_', " "),
            avatar: board.avatar_url.clone(),
            description: board.tagline.clone(),
            color: board.accent_color.clone(),
            updates: board.has_updates,
            link: format!("/!{}", board.slug.replace(' ', "_")),
        }
    }
}

/// The board index.
#[derive(Template, Debug, Clone, PartialEq)]
#[template(path = "boards.html")]
pub struct BoardsDisplay {
    pub boards: Vec<BoardTile>,
}

impl BoardsDisplay {
    pub fn from_boards(boards: &[BoardData]) -> Self {
        Self {
            boards: boards.iter().map(BoardTile::from_board).collect(),
        }
    }
}
