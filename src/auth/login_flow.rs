use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTRY_CODE: &str = "+91";
const PHONE_DIGITS: usize = 10;
const CODE_DIGITS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStep {
    Phone,
    Verify,
    Profile,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("login flow is on step {current:?}, expected {expected:?}")]
    WrongStep { current: LoginStep, expected: LoginStep },
    #[error("mobile number must have 10 digits")]
    InvalidPhone,
    #[error("verification code must have 4 digits")]
    InvalidCode,
    #[error("name is required")]
    MissingName,
}

/// Результат пройденного входа по телефону.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneProfile {
    pub phone: String,
    pub full_name: String,
    pub email: Option<String>,
}

/// Вход по номеру телефона: номер → код → профиль.
///
/// Код не проверяется ни с каким сервисом: подходят любые 4 цифры.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFlow {
    step: LoginStep,
    country_code: String,
    phone: String,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self {
            step: LoginStep::Phone,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            phone: String::new(),
        }
    }
}

impl LoginFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Как поле ввода: оставляет только цифры и обрезает до 10.
    pub fn enter_phone(&mut self, raw: &str) {
        self.phone = raw
            .chars()
            .filter(char::is_ascii_digit)
            .take(PHONE_DIGITS)
            .collect();
    }

    pub fn can_continue(&self) -> bool {
        match self.step {
            LoginStep::Phone => self.phone.len() == PHONE_DIGITS,
            LoginStep::Verify | LoginStep::Profile => true,
            LoginStep::Done => false,
        }
    }

    /// Номер из запроса целиком: без обрезки, ровно 10 цифр.
    /// Номер с кодом страны (`+91 98765 43210`) отклоняется.
    pub fn submit_phone_number(&mut self, raw: &str) -> Result<LoginStep, LoginError> {
        self.expect(LoginStep::Phone)?;
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != PHONE_DIGITS {
            return Err(LoginError::InvalidPhone);
        }
        self.phone = digits;
        self.submit_phone()
    }

    pub fn submit_phone(&mut self) -> Result<LoginStep, LoginError> {
        self.expect(LoginStep::Phone)?;
        if self.phone.len() != PHONE_DIGITS {
            return Err(LoginError::InvalidPhone);
        }
        self.step = LoginStep::Verify;
        Ok(self.step)
    }

    pub fn verify_code(&mut self, code: &str) -> Result<LoginStep, LoginError> {
        self.expect(LoginStep::Verify)?;
        let code = code.trim();
        if code.len() != CODE_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(LoginError::InvalidCode);
        }
        self.step = LoginStep::Profile;
        Ok(self.step)
    }

    pub fn complete_profile(&mut self, name: &str, email: Option<&str>) -> Result<PhoneProfile, LoginError> {
        self.expect(LoginStep::Profile)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(LoginError::MissingName);
        }
        self.step = LoginStep::Done;
        Ok(PhoneProfile {
            phone: format!("{}{}", self.country_code, self.phone),
            full_name: name.to_string(),
            email: email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string),
        })
    }

    fn expect(&self, expected: LoginStep) -> Result<(), LoginError> {
        if self.step != expected {
            return Err(LoginError::WrongStep { current: self.step, expected });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_digits_stay_on_phone() {
        let mut flow = LoginFlow::new();
        flow.enter_phone("987654321");
        assert!(!flow.can_continue());
        assert_eq!(flow.submit_phone(), Err(LoginError::InvalidPhone));
        assert_eq!(flow.step(), LoginStep::Phone);

        flow.enter_phone("9876543210");
        assert!(flow.can_continue());
        assert_eq!(flow.submit_phone(), Ok(LoginStep::Verify));
    }

    #[test]
    fn test_phone_input_is_sanitised() {
        let mut flow = LoginFlow::new();
        flow.enter_phone("(987) 654-3210 99");
        assert_eq!(flow.phone(), "9876543210");
    }

    #[test]
    fn test_submitted_number_is_not_truncated() {
        let mut flow = LoginFlow::new();
        assert_eq!(flow.submit_phone_number("98765432101"), Err(LoginError::InvalidPhone));
        assert_eq!(flow.submit_phone_number("+91 98765 43210"), Err(LoginError::InvalidPhone));
        assert_eq!(flow.submit_phone_number("987654321"), Err(LoginError::InvalidPhone));
        assert_eq!(flow.step(), LoginStep::Phone);
        assert_eq!(flow.phone(), "");

        assert_eq!(flow.submit_phone_number("98765 43210"), Ok(LoginStep::Verify));
        assert_eq!(flow.phone(), "9876543210");
    }

    #[test]
    fn test_any_four_digits_verify() {
        let mut flow = LoginFlow::new();
        flow.enter_phone("9876543210");
        flow.submit_phone().unwrap();
        assert_eq!(flow.verify_code("12a4"), Err(LoginError::InvalidCode));
        assert_eq!(flow.verify_code("123"), Err(LoginError::InvalidCode));
        assert_eq!(flow.verify_code("0000"), Ok(LoginStep::Profile));
    }

    #[test]
    fn test_profile_completes_flow() {
        let mut flow = LoginFlow::new();
        flow.enter_phone("9876543210");
        flow.submit_phone().unwrap();
        flow.verify_code("4321").unwrap();
        assert_eq!(flow.complete_profile("  ", None), Err(LoginError::MissingName));

        let profile = flow.complete_profile("Asha", Some(" ")).unwrap();
        assert_eq!(profile.phone, "+919876543210");
        assert_eq!(profile.email, None);
        assert_eq!(flow.step(), LoginStep::Done);
        assert!(!flow.can_continue());
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut flow = LoginFlow::new();
        assert!(matches!(flow.verify_code("1234"), Err(LoginError::WrongStep { .. })));
        assert!(matches!(
            flow.complete_profile("Asha", None),
            Err(LoginError::WrongStep { current: LoginStep::Phone, expected: LoginStep::Profile })
        ));
    }
}
