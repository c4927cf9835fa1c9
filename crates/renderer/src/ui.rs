//! Retained 2D overlay tree.
//!
//! Coordinates are screen pixels relative to the screen center, +X right and
//! +Y up. Layout and text shaping are the backend's problem.

use glam::{Vec2, Vec4};

#[derive(Debug, Clone, PartialEq)]
pub enum UiContent {
    /// Pure container.
    Group,
    /// Solid rectangle of `size` pixels.
    Rect { size: Vec2, color: Vec4 },
    Text { text: String, font_size: f32, color: Vec4 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiNode {
    pub id: String,
    pub position: Vec2,
    pub visible: bool,
    pub opacity: f32,
    /// Higher is drawn on top.
    pub z_index: i32,
    pub content: UiContent,
    pub children: Vec<UiNode>,
}

impl UiNode {
    fn with_content(id: impl Into<String>, content: UiContent) -> Self {
        Self {
            id: id.into(),
            position: Vec2::ZERO,
            visible: true,
            opacity: 1.0,
            z_index: 0,
            content,
            children: Vec::new(),
        }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self::with_content(id, UiContent::Group)
    }

    pub fn rect(id: impl Into<String>, size: Vec2, color: Vec4) -> Self {
        Self::with_content(id, UiContent::Rect { size, color })
    }

    pub fn text(id: impl Into<String>, text: impl Into<String>, font_size: f32, color: Vec4) -> Self {
        Self::with_content(
            id,
            UiContent::Text {
                text: text.into(),
                font_size,
                color,
            },
        )
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_z(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_child(mut self, child: UiNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: UiNode) {
        self.children.push(child);
    }

    /// Depth-first search by id.
    pub fn find(&self, id: &str) -> Option<&UiNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Number of visible nodes in this subtree. Hidden nodes hide their children.
    pub fn visible_count(&self) -> usize {
        if !self.visible {
            return 0;
        }
        1 + self.children.iter().map(UiNode::visible_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_and_count() {
        let mut hidden = UiNode::rect("bar_bg", Vec2::new(200.0, 10.0), Vec4::ONE);
        hidden.visible = false;
        let tree = UiNode::group("hud")
            .with_child(UiNode::text("wave", "Wave 1", 18.0, Vec4::ONE).at(0.0, 200.0))
            .with_child(hidden.with_child(UiNode::group("inner")));

        assert!(tree.find("inner").is_some());
        assert!(tree.find("nope").is_none());
        assert_eq!(tree.visible_count(), 2);
    }
}
