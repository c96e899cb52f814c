/// Turns cumulative output duration into a non-decreasing `0..=100` percentage.
///
/// Every call to [`report`](Self::report) forwards a value to the callback, even when it repeats
/// the previous one.
pub struct ProgressAccountant<'a> {
    total: f64,
    last: Option<u8>,
    on_progress: Option<&'a mut dyn FnMut(u8)>,
}

impl<'a> ProgressAccountant<'a> {
    /// Accountant for a merge producing `total` seconds of output.
    pub fn new(total: f64, on_progress: Option<&'a mut dyn FnMut(u8)>) -> Self {
        Self {
            total,
            last: None,
            on_progress,
        }
    }

    /// Report `cumulative` seconds emitted so far and return the percentage sent.
    pub fn report(&mut self, cumulative: f64) -> u8 {
        let pct = percent(cumulative, self.total);
        self.emit(pct)
    }

    /// Report completion.
    pub fn complete(&mut self) -> u8 {
        self.emit(100)
    }

    /// Last value sent, if any.
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    fn emit(&mut self, pct: u8) -> u8 {
        let pct = self.last.map_or(pct, |last| pct.max(last));
        self.last = Some(pct);
        if let Some(cb) = self.on_progress.as_mut() {
            cb(pct);
        }
        pct
    }
}

fn percent(cumulative: f64, total: f64) -> u8 {
    if !total.is_finite() || total <= 0.0 || !cumulative.is_finite() {
        return if cumulative > 0.0 { 100 } else { 0 };
    }
    (100.0 * cumulative / total).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/session/progress.rs"]
mod tests;
