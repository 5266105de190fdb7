/// User-visible messages raised by the view controller.
///
/// `notify` is for confirmations, `alert` for failures the user must see.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);

    fn alert(&self, message: &str);
}
