//! Portal item rows and thumbnails.

use crate::sdk::image::ImageData;
use crate::sdk::portal::PortalItem;

/// Symbol shown for an item without a loaded thumbnail.
pub const ITEM_PLACEHOLDER: &str = "globe";

/// Symbol shown for a user without a loaded thumbnail.
pub const USER_PLACEHOLDER: &str = "person";

/// A thumbnail to display: the loaded image or a placeholder symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    Image(ImageData),
    Placeholder(&'static str),
}

impl Thumbnail {
    /// `image` if there is one, else the `placeholder` symbol.
    pub fn or_placeholder(image: Option<ImageData>, placeholder: &'static str) -> Self {
        match image {
            Some(image) => Self::Image(image),
            None => Self::Placeholder(placeholder),
        }
    }

    pub fn image(&self) -> Option<&ImageData> {
        match self {
            Self::Image(image) => Some(image),
            Self::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// One row of the portal browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalItemViewModel {
    pub id: String,
    pub title: String,
    pub type_name: String,
    pub view_count: u64,
    pub thumbnail: Thumbnail,
}

impl PortalItemViewModel {
    pub fn new(item: &PortalItem, thumbnail: Option<ImageData>) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            type_name: item.display_type_name(),
            view_count: item.view_count,
            thumbnail: Thumbnail::or_placeholder(thumbnail, ITEM_PLACEHOLDER),
        }
    }

    /// "1 view", otherwise "N views".
    pub fn view_count_text(&self) -> String {
        let unit = if self.view_count == 1 { "view" } else { "views" };
        format!("{} {unit}", self.view_count)
    }
}
