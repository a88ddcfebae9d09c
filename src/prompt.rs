//! Interactive prompts.

use std::path::{Path, PathBuf};

use inquire::validator::Validation;
use inquire::{Confirm, CustomUserError, InquireError, Password, PasswordDisplayMode, Select, Text};

use nft_updater::api::{validate_address, validate_json, validate_royalty};
use nft_updater::prelude::*;

use crate::Mode;

const OPTIONAL: &str = "optional, leave blank if not updating";

pub fn banner() {
    println!();
    println!("  NFT Updater CLI");
    println!("  Update Solana NFT metadata, signed on this machine");
    println!();
}

pub fn mode() -> Result<Mode, InquireError> {
    let choice = Select::new(
        "Would you like to update a single NFT or multiple NFTs?",
        vec!["Single", "Multiple"],
    )
    .prompt()?;

    if choice == "Single" {
        return Ok(Mode::Single);
    }
    let file = Text::new("Enter the path to your JSON file:")
        .with_validator(validator(existing_file))
        .prompt()?;
    Ok(Mode::Batch {
        file: PathBuf::from(file.trim()),
    })
}

pub fn enter_keys_now() -> Result<bool, InquireError> {
    Confirm::new("Do you want to enter your private key now?")
        .with_help_message(
            "The key is only kept on this machine, in the env file, and is used to sign the update",
        )
        .with_default(true)
        .prompt()
}

pub fn private_key() -> Result<String, InquireError> {
    Password::new("Enter your private key (Phantom base58, keypair array or base64):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
}

/// Fee payer address and raw private key, if the user wants a separate fee payer.
pub fn fee_payer_override() -> Result<Option<(String, String)>, InquireError> {
    let use_custom = Confirm::new("Do you want a different account to pay the transaction fee?")
        .with_default(false)
        .prompt()?;
    if !use_custom {
        return Ok(None);
    }

    let address = Text::new("Enter the fee payer address:")
        .with_validator(validator(validate_address))
        .prompt()?;
    let key = Password::new("Enter the fee payer private key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    Ok(Some((address, key)))
}

/// Collect the fields of one update.
pub fn update_request(fee_payer: Option<String>) -> Result<UpdateRequest, InquireError> {
    let network = Select::new("Select the network:", Network::ALL.to_vec()).prompt()?;
    let token_address = Text::new("Enter the token address:")
        .with_validator(validator(validate_address))
        .prompt()?;
    let update_authority = Text::new("Enter the update authority address:")
        .with_validator(validator(validate_address))
        .prompt()?;

    let mut request = UpdateRequest::new(network, token_address.trim(), update_authority.trim());

    for field in UpdateField::ALL {
        let mut text = Text::new(field_message(field))
            .with_help_message(OPTIONAL)
            .with_validator(validator(field_check(field)));
        if field == UpdateField::FeePayerAddress {
            if let Some(address) = fee_payer.as_deref() {
                text = text.with_default(address);
            }
        }
        let value = text.prompt()?;
        request.set(field, value.trim());
    }

    Ok(request)
}

fn field_message(field: UpdateField) -> &'static str {
    match field {
        UpdateField::Name => "Enter the NFT name:",
        UpdateField::Symbol => "Enter the NFT symbol:",
        UpdateField::Description => "Enter the NFT description:",
        UpdateField::Attributes => "Enter the attributes in JSON format:",
        UpdateField::Royalty => "Enter the royalty (0-100):",
        UpdateField::Image => "Enter the path to the image file:",
        UpdateField::Data => "Enter the path to the digital data file:",
        UpdateField::ServiceCharge => "Enter the service charge in JSON format:",
        UpdateField::FeePayerAddress => {
            "Enter the fee payer address (blank: the update authority pays):"
        }
    }
}

fn field_check(field: UpdateField) -> fn(&str) -> Result<(), String> {
    match field {
        UpdateField::Attributes | UpdateField::ServiceCharge => validate_json,
        UpdateField::Royalty => validate_royalty,
        UpdateField::Image | UpdateField::Data => optional_file,
        UpdateField::FeePayerAddress => optional_address,
        UpdateField::Name | UpdateField::Symbol | UpdateField::Description => any,
    }
}

fn validator(
    check: fn(&str) -> Result<(), String>,
) -> impl Fn(&str) -> Result<Validation, CustomUserError> + Clone {
    move |input: &str| {
        Ok(match check(input) {
            Ok(()) => Validation::Valid,
            Err(msg) => Validation::Invalid(msg.into()),
        })
    }
}

fn any(_: &str) -> Result<(), String> {
    Ok(())
}

fn existing_file(input: &str) -> Result<(), String> {
    if Path::new(input.trim()).is_file() {
        Ok(())
    } else {
        Err("File does not exist!".to_string())
    }
}

fn optional_file(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        return Ok(());
    }
    existing_file(input)
}

fn optional_address(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        return Ok(());
    }
    validate_address(input)
}
