//! Domaine ZCS

zcs_entity! {
    /// Un domaine de messagerie
    ///
    /// `zimbraDomainName` n'est pas un champ séparé : c'est le nom du
    /// domaine.
    pub struct Domain {
        @name => "zimbraDomainName";
        default_cos_id, set_default_cos_id => "zimbraDomainDefaultCOSId",
    }
}
