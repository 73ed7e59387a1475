use async_trait::async_trait;
use trellis_core::Element;

use super::absorb;
use crate::error::WidgetResult;
use crate::widget::{Widget, WidgetBase};

/// A widget that logs each completed phase.
#[derive(Debug, Default)]
pub struct WidgetB {
    base: WidgetBase,
}

impl WidgetB {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Widget for WidgetB {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn widget_base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    async fn pre_init(&mut self, target: &Element) -> WidgetResult<()> {
        let result = self.base.pre_init(target);
        if absorb(self, "Widget B", "pre-initialization", result) {
            tracing::info!(target: "trellis::widget", "Widget B pre-initialization.");
        }
        Ok(())
    }

    async fn post_init(&mut self, _target: &Element) -> WidgetResult<()> {
        let result = self.base.post_init();
        if absorb(self, "Widget B", "post-initialization", result) {
            tracing::info!(target: "trellis::widget", "Widget B post-initialization.");
        }
        Ok(())
    }
}
