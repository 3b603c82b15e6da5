// src/services/access_policy.rs
// DOCUMENTATION: Who may see or change what
// PURPOSE: Role and ownership rules shared by the handlers

use crate::errors::AppError;
use crate::models::{AdminUpdateUserRequest, InquiryStatus, Role, User};
use uuid::Uuid;

/// Rows a caller may list from contacts or inquiries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    /// Requests on properties listed by this agent
    Agent(Uuid),
    /// Requests sent by this user
    Sender(Uuid),
}

impl ListScope {
    pub fn for_user(user: &User) -> Self {
        match user.role() {
            Role::Admin => ListScope::All,
            Role::Agent => ListScope::Agent(user.id),
            Role::User => ListScope::Sender(user.id),
        }
    }
}

/// Fail with 403 unless the caller has one of `roles`
pub fn require_role(user: &User, roles: &[Role]) -> Result<(), AppError> {
    let role = user.role();
    if roles.contains(&role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            role
        )))
    }
}

/// Listing owner or an admin
pub fn ensure_owner_or_admin(user: &User, owner_id: Uuid) -> Result<(), AppError> {
    if user.is_admin() || user.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "User {} is not authorized to modify this resource",
            user.id
        )))
    }
}

/// Contacts and inquiries are visible to admins, the listing agent and the sender
pub fn can_view_request(user: &User, agent_id: Uuid, sender_id: Option<Uuid>) -> bool {
    user.is_admin() || user.id == agent_id || sender_id == Some(user.id)
}

pub fn ensure_can_view_request(
    user: &User,
    agent_id: Uuid,
    sender_id: Option<Uuid>,
) -> Result<(), AppError> {
    if can_view_request(user, agent_id, sender_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to access this request".to_string(),
        ))
    }
}

/// Agents and admins may set any status; the asking user may only close
pub fn ensure_can_set_inquiry_status(
    user: &User,
    agent_id: Uuid,
    sender_id: Uuid,
    status: InquiryStatus,
) -> Result<(), AppError> {
    if user.is_admin() || user.id == agent_id {
        return Ok(());
    }
    if user.id == sender_id {
        if status == InquiryStatus::Closed {
            return Ok(());
        }
        return Err(AppError::Forbidden(
            "You can only close your own inquiry".to_string(),
        ));
    }
    Err(AppError::Forbidden(
        "Not authorized to update this inquiry".to_string(),
    ))
}

/// Agents cannot open an inquiry on their own listing
pub fn ensure_not_own_listing(user: &User, agent_id: Uuid) -> Result<(), AppError> {
    if user.id == agent_id {
        return Err(AppError::InvalidInput(
            "You cannot send an inquiry about your own property".to_string(),
        ));
    }
    Ok(())
}

/// Closed inquiries take no further responses
pub fn ensure_inquiry_open(status: InquiryStatus) -> Result<(), AppError> {
    if status == InquiryStatus::Closed {
        return Err(AppError::InvalidInput(
            "Cannot respond to a closed inquiry".to_string(),
        ));
    }
    Ok(())
}

/// Follow-up on a contact request or inquiry: the listing agent or an admin
pub fn ensure_listing_agent_or_admin(user: &User, agent_id: Uuid) -> Result<(), AppError> {
    require_role(user, &[Role::Agent, Role::Admin])?;
    ensure_owner_or_admin(user, agent_id)
}

/// Admins cannot lock themselves out through the user console
pub fn ensure_admin_keeps_access(
    admin: &User,
    target_id: Uuid,
    req: &AdminUpdateUserRequest,
) -> Result<(), AppError> {
    if admin.id != target_id {
        return Ok(());
    }
    if matches!(req.role, Some(role) if role != Role::Admin) {
        return Err(AppError::InvalidInput(
            "You cannot remove your own admin role".to_string(),
        ));
    }
    if req.is_active == Some(false) {
        return Err(AppError::InvalidInput(
            "You cannot deactivate your own account".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_not_self(admin: &User, target_id: Uuid) -> Result<(), AppError> {
    if admin.id == target_id {
        Err(AppError::InvalidInput(
            "You cannot delete your own account".to_string(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    pub(crate) fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: format!("{}@example.com", role),
            password_hash: String::new(),
            phone: None,
            role: role.as_str().to_string(),
            user_type_id: None,
            avatar_url: None,
            is_active: true,
            custom_fields: json!({}),
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user_type_name: None,
        }
    }

    #[test]
    fn test_list_scope_by_role() {
        let admin = user_with_role(Role::Admin);
        let agent = user_with_role(Role::Agent);
        let user = user_with_role(Role::User);

        assert_eq!(ListScope::for_user(&admin), ListScope::All);
        assert_eq!(ListScope::for_user(&agent), ListScope::Agent(agent.id));
        assert_eq!(ListScope::for_user(&user), ListScope::Sender(user.id));
    }

    #[test]
    fn test_require_role() {
        let user = user_with_role(Role::User);
        assert!(require_role(&user, &[Role::User, Role::Agent]).is_ok());
        assert!(matches!(
            require_role(&user, &[Role::Agent, Role::Admin]),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_owner_or_admin() {
        let agent = user_with_role(Role::Agent);
        let admin = user_with_role(Role::Admin);
        let other = Uuid::new_v4();

        assert!(ensure_owner_or_admin(&agent, agent.id).is_ok());
        assert!(ensure_owner_or_admin(&agent, other).is_err());
        assert!(ensure_owner_or_admin(&admin, other).is_ok());
    }

    #[test]
    fn test_request_visibility() {
        let agent = user_with_role(Role::Agent);
        let sender = user_with_role(Role::User);
        let stranger = user_with_role(Role::User);
        let admin = user_with_role(Role::Admin);

        assert!(can_view_request(&agent, agent.id, Some(sender.id)));
        assert!(can_view_request(&sender, agent.id, Some(sender.id)));
        assert!(can_view_request(&admin, agent.id, None));
        assert!(!can_view_request(&stranger, agent.id, Some(sender.id)));
        // Anonymous contact requests are not visible to other users
        assert!(!can_view_request(&stranger, agent.id, None));
    }

    #[test]
    fn test_inquiry_status_rules() {
        let agent = user_with_role(Role::Agent);
        let sender = user_with_role(Role::User);
        let stranger = user_with_role(Role::User);

        assert!(ensure_can_set_inquiry_status(&agent, agent.id, sender.id, InquiryStatus::Open).is_ok());
        assert!(ensure_can_set_inquiry_status(&sender, agent.id, sender.id, InquiryStatus::Closed).is_ok());
        assert!(ensure_can_set_inquiry_status(&sender, agent.id, sender.id, InquiryStatus::Responded).is_err());
        assert!(ensure_can_set_inquiry_status(&stranger, agent.id, sender.id, InquiryStatus::Closed).is_err());
    }

    #[test]
    fn test_admin_cannot_lock_themselves_out() {
        let admin = user_with_role(Role::Admin);
        let demote = AdminUpdateUserRequest {
            role: Some(Role::User),
            ..Default::default()
        };
        let deactivate = AdminUpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        };
        let rename = AdminUpdateUserRequest {
            name: Some("New Name".to_string()),
            role: Some(Role::Admin),
            ..Default::default()
        };

        assert!(ensure_admin_keeps_access(&admin, admin.id, &demote).is_err());
        assert!(ensure_admin_keeps_access(&admin, admin.id, &deactivate).is_err());
        assert!(ensure_admin_keeps_access(&admin, admin.id, &rename).is_ok());
        // Other accounts can be demoted
        assert!(ensure_admin_keeps_access(&admin, Uuid::new_v4(), &demote).is_ok());

        assert!(ensure_not_self(&admin, admin.id).is_err());
        assert!(ensure_not_self(&admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_agent_cannot_inquire_on_own_listing() {
        let agent = user_with_role(Role::Agent);
        let buyer = user_with_role(Role::User);

        assert!(matches!(
            ensure_not_own_listing(&agent, agent.id),
            Err(AppError::InvalidInput(_))
        ));
        assert!(ensure_not_own_listing(&buyer, agent.id).is_ok());
        // Agents may still ask about someone else's listing
        assert!(ensure_not_own_listing(&agent, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_closed_inquiry_takes_no_response() {
        assert!(ensure_inquiry_open(InquiryStatus::Open).is_ok());
        assert!(ensure_inquiry_open(InquiryStatus::Responded).is_ok());
        assert!(matches!(
            ensure_inquiry_open(InquiryStatus::Closed),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_contact_follow_up_needs_listing_agent_or_admin() {
        let agent = user_with_role(Role::Agent);
        let other_agent = user_with_role(Role::Agent);
        let admin = user_with_role(Role::Admin);
        let sender = user_with_role(Role::User);

        assert!(ensure_listing_agent_or_admin(&agent, agent.id).is_ok());
        assert!(ensure_listing_agent_or_admin(&admin, agent.id).is_ok());
        assert!(matches!(
            ensure_listing_agent_or_admin(&other_agent, agent.id),
            Err(AppError::Forbidden(_))
        ));
        // The sender of the request cannot change its status
        assert!(matches!(
            ensure_listing_agent_or_admin(&sender, agent.id),
            Err(AppError::Forbidden(_))
        ));
        // A plain user record that happens to match the agent id still lacks the role
        let mut demoted = user_with_role(Role::User);
        demoted.id = agent.id;
        assert!(ensure_listing_agent_or_admin(&demoted, agent.id).is_err());
    }
}
