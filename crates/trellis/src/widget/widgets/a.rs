use async_trait::async_trait;
use trellis_core::Element;

use super::absorb;
use crate::error::WidgetResult;
use crate::widget::{Widget, WidgetBase};

/// A widget that only runs the base lifecycle.
#[derive(Debug, Default)]
pub struct WidgetA {
    base: WidgetBase,
}

impl WidgetA {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Widget for WidgetA {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn widget_base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    async fn pre_init(&mut self, target: &Element) -> WidgetResult<()> {
        let result = self.base.pre_init(target);
        absorb(self, "Widget A", "pre-initialization", result);
        Ok(())
    }

    async fn post_init(&mut self, _target: &Element) -> WidgetResult<()> {
        let result = self.base.post_init();
        absorb(self, "Widget A", "post-initialization", result);
        Ok(())
    }
}
