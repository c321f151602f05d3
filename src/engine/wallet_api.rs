use super::Engine;

use async_trait::async_trait;

use crate::{api::WalletAPI, auth::User, entities::Wallet, error::Error};

#[async_trait]
impl WalletAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_wallet(&self, user: User) -> Result<Wallet, Error> {
        // no profile row yet means nothing was ever credited
        let balance = self
            .store
            .find_profile(user.id)
            .await?
            .map(|profile| profile.wallet_balance)
            .unwrap_or_default();

        let transactions = self.store.list_transactions(user.id).await?;

        Ok(Wallet {
            user_id: user.id,
            balance,
            transactions,
        })
    }
}
