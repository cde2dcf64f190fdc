use std::fmt;

/// Named views of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    Login,
    Register,
    /// Shown after registration while the verification email is pending.
    VerifyEmail,
    ForgotPassword,
    Dashboard,
}

impl Destination {
    pub const ALL: [Self; 5] = [
        Self::Login,
        Self::Register,
        Self::VerifyEmail,
        Self::ForgotPassword,
        Self::Dashboard,
    ];

    /// Where the root path and unknown paths land.
    pub const DEFAULT: Self = Self::Login;

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::VerifyEmail => "/verification",
            Self::ForgotPassword => "/forgot-pass",
            Self::Dashboard => "/dashboard",
        }
    }

    /// Whether entering this view requires a signed-in user.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// Resolves a path; the root path redirects to the default destination.
    /// Query strings, fragments and trailing slashes are ignored.
    #[must_use]
    pub fn resolve(path: &str) -> Option<Self> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('/');

        if path.is_empty() {
            return Some(Self::DEFAULT);
        }

        Self::ALL
            .into_iter()
            .find(|destination| destination.path().trim_start_matches('/') == path)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_redirects_to_login() {
        assert_eq!(Destination::resolve(""), Some(Destination::Login));
        assert_eq!(Destination::resolve("/"), Some(Destination::Login));
        assert_eq!(Destination::resolve("/?next=x"), Some(Destination::Login));
    }

    #[test]
    fn every_destination_resolves_from_its_path() {
        for destination in Destination::ALL {
            assert_eq!(Destination::resolve(destination.path()), Some(destination));
        }
        assert_eq!(Destination::resolve("dashboard/"), Some(Destination::Dashboard));
        assert_eq!(
            Destination::resolve("/forgot-pass#top"),
            Some(Destination::ForgotPassword)
        );
    }

    #[test]
    fn unknown_paths_do_not_resolve() {
        assert_eq!(Destination::resolve("/admin"), None);
        assert_eq!(Destination::resolve("/dashboard/extra"), None);
    }

    #[test]
    fn only_dashboard_is_protected() {
        let protected: Vec<_> = Destination::ALL
            .into_iter()
            .filter(|d| d.is_protected())
            .collect();
        assert_eq!(protected, vec![Destination::Dashboard]);
    }
}
