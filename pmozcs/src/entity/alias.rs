//! Alias de compte

zcs_entity! {
    /// Une adresse alias pointant vers un compte
    pub struct Alias {
        /// Identifiant du compte cible
        target_id, set_target_id => "zimbraAliasTargetId",
        /// Nom du compte cible, attribut racine `targetName`
        target_name, set_target_name => "@targetName",
        username, set_username => "uid",
    }
}
