use async_trait::async_trait;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete?";

/// Interactive yes/no capability consulted before destructive operations.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

pub struct AlwaysConfirm;

#[async_trait]
impl Confirmer for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub struct NeverConfirm;

#[async_trait]
impl Confirmer for NeverConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Adapts a plain closure into a [`Confirmer`].
pub struct FnConfirmer<F>(pub F);

#[async_trait]
impl<F> Confirmer for FnConfirmer<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn confirm(&self, prompt: &str) -> bool {
        (self.0)(prompt)
    }
}
