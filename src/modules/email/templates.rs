/// A rendered email ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

pub fn activation_email(sender_name: &str, activation_link: &str) -> EmailContent {
    EmailContent {
        subject: format!("{} - Activate Your Account", sender_name),
        body: format!(
            "Welcome!\n\
            \n\
            Please activate your account by opening the following link:\n\
            \n\
            {}\n\
            \n\
            If you did not create an account, you can ignore this email.\n\
            \n\
            Best regards,\n\
            {}",
            activation_link, sender_name
        ),
    }
}

pub fn password_reset_email(
    sender_name: &str,
    reset_link: &str,
    valid_for_hours: i64,
) -> EmailContent {
    EmailContent {
        subject: format!("{} - Password Reset Request", sender_name),
        body: format!(
            "Hello,\n\n\
            A password reset was requested for your account.\n\n\
            You can reset your password by opening the following link:\n\n\
            {}\n\n\
            This link will expire in {} hours and can only be used once.\n\n\
            If you did not request this reset, please ignore this email and ensure \
            your account is secure.\n\n\
            Best regards,\n\
            {}",
            reset_link, valid_for_hours, sender_name
        ),
    }
}
