use crate::error::InputError;
use crate::models::{ConversationTurn, Role, TurnPayload};

/// Places the synthesized instruction ahead of the caller's history.
///
/// Caller turns keep their order, role and content, including any earlier
/// system turns. A turn with an unrecognized role rejects the whole request.
pub fn assemble(
    instruction: &str,
    history: &[TurnPayload],
) -> Result<Vec<ConversationTurn>, InputError> {
    let mut turns = Vec::with_capacity(history.len() + 1);
    turns.push(ConversationTurn::new(Role::System, instruction));

    for (index, turn) in history.iter().enumerate() {
        let role = turn
            .role
            .parse::<Role>()
            .map_err(|_| InputError::UnknownRole {
                index,
                role: turn.role.clone(),
            })?;
        turns.push(ConversationTurn::new(role, turn.content.clone()));
    }

    Ok(turns)
}
