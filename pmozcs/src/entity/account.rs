//! Compte ZCS

zcs_entity! {
    /// Un compte de messagerie.
    ///
    /// Le mot de passe n'est jamais lisible côté serveur : une lecture
    /// renvoie `VALUE-BLOCKED`.
    pub struct Account {
        /// Partie locale de l'adresse (`uid`)
        username, set_username => "uid",
        password, set_password => "userPassword",
        display_name, set_display_name => "displayName",
        /// `active`, `locked`, `closed`...
        account_status, set_account_status => "zimbraAccountStatus",
        /// Quota en octets, 0 pour illimité
        mail_quota, set_mail_quota => "zimbraMailQuota",
        /// Serveur hébergeant la boîte, calculé par le serveur
        host, set_host => "zimbraMailHost",
        common_name, set_common_name => "cn",
        cos_id, set_cos_id => "zimbraCOSId",
    }
}

impl Account {
    pub fn mail_quota_bytes(&self) -> Option<u64> {
        self.mail_quota().and_then(|quota| quota.parse().ok())
    }

    pub fn is_active(&self) -> bool {
        self.account_status() == Some("active")
    }
}
