//! Transaction signing for subxt.

use crate::wallet::Keypair;
use sp_core::{sr25519, Pair};
use sp_runtime::{
    traits::{IdentifyAccount, Verify},
    MultiSignature as SpMultiSignature,
};
use subxt::{
    config::substrate::{AccountId32, MultiSignature},
    tx::Signer,
    Config, PolkadotConfig,
};

/// An sr25519 pair signer implementing the subxt `Signer` trait.
#[derive(Clone)]
pub struct PairSigner {
    account_id: <PolkadotConfig as Config>::AccountId,
    signer: sr25519::Pair,
}

impl PairSigner {
    pub fn new(signer: sr25519::Pair) -> Self {
        let account_id =
            <SpMultiSignature as Verify>::Signer::from(Pair::public(&signer)).into_account();
        Self {
            // sp_core::AccountId32 to subxt::config::substrate::AccountId32
            account_id: AccountId32(account_id.into()),
            signer,
        }
    }

    /// Build a signer from a wallet keypair.
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self::new(keypair.pair().clone())
    }

    pub fn signer(&self) -> &sr25519::Pair {
        &self.signer
    }

    pub fn account_id(&self) -> &AccountId32 {
        &self.account_id
    }
}

impl Signer<PolkadotConfig> for PairSigner {
    fn account_id(&self) -> <PolkadotConfig as Config>::AccountId {
        self.account_id.clone()
    }

    fn sign(&self, signer_payload: &[u8]) -> <PolkadotConfig as Config>::Signature {
        let signature = Pair::sign(&self.signer, signer_payload);
        MultiSignature::Sr25519(signature.0)
    }
}

/// Create a signer from a seed phrase, URI, or dev account (`//Alice`).
pub fn signer_from_seed(seed: &str) -> anyhow::Result<PairSigner> {
    let pair = sr25519::Pair::from_string(seed, None)
        .map_err(|e| anyhow::anyhow!("Failed to create pair from seed: {:?}", e))?;
    Ok(PairSigner::new(pair))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_from_keypair_matches_address() {
        let keypair = Keypair::generate();
        let signer = PairSigner::from_keypair(&keypair);
        assert_eq!(&signer.account_id().0, keypair.public_key());
    }

    #[test]
    fn test_signer_from_seed() {
        let alice = signer_from_seed("//Alice").unwrap();
        let again = signer_from_seed("//Alice").unwrap();
        assert_eq!(alice.account_id(), again.account_id());
    }

    #[test]
    fn test_sign_produces_valid_signature() {
        let keypair = Keypair::generate();
        let signer = PairSigner::from_keypair(&keypair);

        let payload = b"payload";
        match Signer::<PolkadotConfig>::sign(&signer, payload) {
            MultiSignature::Sr25519(sig) => {
                assert!(keypair.verify(payload, &sig));
            }
            _ => panic!("expected sr25519 signature"),
        }
    }
}
