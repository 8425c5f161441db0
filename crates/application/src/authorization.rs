use schedly_core::{Actor, AppError, AppResult, UserId};
use schedly_domain::{Capability, Scope, grant_for};

/// Ensures the actor's role holds `capability` and returns the granted scope.
pub fn require_capability(actor: &Actor, capability: Capability) -> AppResult<Scope> {
    grant_for(actor.role(), capability).ok_or_else(|| {
        AppError::Forbidden(format!(
            "role '{}' is missing capability '{}'",
            actor.role(),
            capability.as_str()
        ))
    })
}

/// Ensures an `Owned` grant covers a resource owned by `owner`.
pub fn require_scope(
    actor: &Actor,
    scope: Scope,
    owner: UserId,
    capability: Capability,
) -> AppResult<()> {
    match scope {
        Scope::Any => Ok(()),
        Scope::Owned if owner == actor.user_id() => Ok(()),
        Scope::Owned => Err(AppError::Forbidden(format!(
            "user '{}' may only use '{}' on resources they own",
            actor.user_id(),
            capability.as_str()
        ))),
    }
}
