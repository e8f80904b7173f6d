//! Published derivation vectors and chain-specific address shape.

use butk_wallet::crypto::hd::HdNode;
use butk_wallet::crypto::mnemonic::{seed_from_mnemonic, validate_mnemonic};
use butk_wallet::hardware::DerivationPath;
use butk_wallet::{Network, NetworkParams};
use pretty_assertions::assert_eq;

const VECTOR_WORDS: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

const VECTOR_SEED_HEX: &str =
    "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
     9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4";

fn params() -> NetworkParams {
    NetworkParams::for_network(Network::Mainnet)
}

#[test]
fn mnemonic_vector_produces_published_seed() {
    assert!(validate_mnemonic(VECTOR_WORDS));
    let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    assert_eq!(hex::encode(seed.as_slice()), VECTOR_SEED_HEX);
}

#[test]
fn passphrase_changes_the_seed() {
    let plain = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    let salted = seed_from_mnemonic(VECTOR_WORDS, "TREZOR").unwrap();
    assert_ne!(*plain, *salted);
}

#[test]
fn account_derivation_is_stable() {
    let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    let account = HdNode::from_seed(seed.as_ref(), params())
        .unwrap()
        .derive_account()
        .unwrap();
    let address = account.key_material().unwrap().address();
    assert!(address.starts_with('X'));
    assert_eq!(address.len(), 34);

    // Deriving again from the words yields the identical address.
    let again = HdNode::from_seed(
        seed_from_mnemonic(VECTOR_WORDS, "").unwrap().as_ref(),
        params(),
    )
    .unwrap()
    .derive_account()
    .unwrap();
    assert_eq!(address, again.key_material().unwrap().address());
}

#[test]
fn account_path_matches_explicit_path_walk() {
    let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    let master = HdNode::from_seed(seed.as_ref(), params()).unwrap();
    let path: DerivationPath = "m/88'/0'/0'".parse().unwrap();
    assert_eq!(
        master.derive_account().unwrap().public_key(),
        master.derive_path(&path).unwrap().public_key()
    );
}

#[test]
fn watch_only_pages_match_private_pages() {
    let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    let account = HdNode::from_seed(seed.as_ref(), params())
        .unwrap()
        .derive_account()
        .unwrap();
    let watch = account.to_watch_only();

    let private_page = account.derive_account_page(0, 20).unwrap();
    let public_page = watch.derive_account_page(0, 20).unwrap();
    for (private_node, public_node) in private_page.iter().zip(&public_page) {
        assert_eq!(
            private_node.key_material().unwrap().address(),
            public_node.key_material().unwrap().address()
        );
    }
}

#[test]
fn wif_round_trip_preserves_the_key() {
    let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    let material = HdNode::from_seed(seed.as_ref(), params())
        .unwrap()
        .derive_account()
        .unwrap()
        .key_material()
        .unwrap();
    let wif = material.to_wif().unwrap();
    let restored = butk_wallet::KeyMaterial::from_wif(&wif, params()).unwrap();
    assert_eq!(material.address(), restored.address());
}

#[test]
fn testnet_wif_is_not_accepted_on_mainnet() {
    let testnet = NetworkParams::for_network(Network::Testnet);
    let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    let wif = HdNode::from_seed(seed.as_ref(), testnet)
        .unwrap()
        .derive_account()
        .unwrap()
        .key_material()
        .unwrap()
        .to_wif()
        .unwrap();
    assert!(butk_wallet::KeyMaterial::from_wif(&wif, params()).is_err());
}

#[test]
fn mnemonic_ownership_check() {
    let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    let material = HdNode::from_seed(seed.as_ref(), params())
        .unwrap()
        .derive_account()
        .unwrap()
        .key_material()
        .unwrap();
    assert!(material.verify_mnemonic(VECTOR_WORDS, ""));
    assert!(!material.verify_mnemonic(VECTOR_WORDS, "wrong-passphrase"));
    assert!(!material.verify_mnemonic("abandon ability able", ""));
}

#[test]
fn mobile_accounts_are_hardened_siblings() {
    let seed = seed_from_mnemonic(VECTOR_WORDS, "").unwrap();
    let master = HdNode::from_seed(seed.as_ref(), params()).unwrap();
    let page = master.derive_mobile_page(3).unwrap();
    // Index 0 of the mobile layout is the fixed account node.
    assert_eq!(
        page[0].public_key(),
        master.derive_account().unwrap().public_key()
    );
    assert_ne!(page[1].public_key(), page[2].public_key());
}
