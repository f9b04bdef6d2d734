/// Asks the user for a background image.
pub trait ResourcePicker {
    /// File name of the chosen image, or `None` when the user cancelled.
    fn pick_background(&mut self) -> Option<String>;
}

/// Never picks anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPicker;

impl ResourcePicker for NoPicker {
    fn pick_background(&mut self) -> Option<String> {
        None
    }
}

/// Hands out queued answers in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct QueuePicker {
    pub answers: std::collections::VecDeque<Option<String>>,
}

#[cfg(test)]
impl ResourcePicker for QueuePicker {
    fn pick_background(&mut self) -> Option<String> {
        self.answers.pop_front().flatten()
    }
}
