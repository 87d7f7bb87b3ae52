use serde::{Deserialize, Serialize};

/// JWT claims identifying the authenticated user.
/// Handlers pass `user_id` explicitly into every service call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserClaims {
    pub user_id: i64,
    pub username: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_claims_serialization() {
        let claims = UserClaims {
            user_id: 42,
            username: "alex".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"user_id\":42"));
        assert!(json.contains("alex"));

        let deserialized: UserClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }
}
