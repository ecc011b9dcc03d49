//! Status codes reported by the remote service or synthesized locally.

// address: success
pub const ADDRESS_CORRECT: &str = "address_correct";
pub const COUNTRY_CODE_CORRECT: &str = "country_code_correct";
pub const POSTAL_CODE_CORRECT: &str = "postal_code_correct";
pub const LOCALITY_CORRECT: &str = "locality_correct";
pub const STREET_NAME_CORRECT: &str = "street_name_correct";
pub const BUILDING_NUMBER_CORRECT: &str = "building_number_correct";
pub const ADDRESS_SELECTED_BY_CUSTOMER: &str = "address_selected_by_customer";
pub const ADDRESS_SELECTED_AUTOMATICALLY: &str = "address_selected_automatically";

// address: error
pub const ADDRESS_NEEDS_CORRECTION: &str = "address_needs_correction";
pub const ADDRESS_MULTIPLE_VARIANTS: &str = "address_multiple_variants";
pub const ADDRESS_MINOR_CORRECTION: &str = "address_minor_correction";
pub const ADDRESS_NOT_FOUND: &str = "address_not_found";
pub const ADDRESS_OF_NOT_SUPPORTED_TYPE: &str = "address_of_not_supported_type";
pub const COUNTRY_CODE_NEEDS_CORRECTION: &str = "country_code_needs_correction";
pub const POSTAL_CODE_NEEDS_CORRECTION: &str = "postal_code_needs_correction";
pub const LOCALITY_NEEDS_CORRECTION: &str = "locality_needs_correction";
pub const STREET_NAME_NEEDS_CORRECTION: &str = "street_name_needs_correction";
pub const BUILDING_NUMBER_NEEDS_CORRECTION: &str = "building_number_needs_correction";
pub const BUILDING_NUMBER_IS_MISSING: &str = "building_number_is_missing";
pub const BUILDING_NUMBER_NOT_FOUND: &str = "building_number_not_found";

// person
pub const NAME_CORRECT: &str = "name_correct";
pub const SALUTATION_CORRECT: &str = "salutation_correct";
pub const NAME_NEEDS_CORRECTION: &str = "name_needs_correction";
pub const FIRST_NAME_NEEDS_CORRECTION: &str = "first_name_needs_correction";
pub const LAST_NAME_NEEDS_CORRECTION: &str = "last_name_needs_correction";
pub const NAME_NOT_FOUND: &str = "name_not_found";
pub const SALUTATION_NEEDS_CORRECTION: &str = "salutation_needs_correction";

// phone
pub const PHONE_CORRECT: &str = "phone_correct";
pub const PHONE_IS_MOBILE: &str = "phone_is_mobile";
pub const PHONE_IS_FIXED_LINE: &str = "phone_is_fixed_line";
pub const PHONE_INVALID: &str = "phone_invalid";
pub const PHONE_NEEDS_CORRECTION: &str = "phone_needs_correction";
pub const PHONE_SHOULD_BE_MOBILE: &str = "phone_should_be_mobile";
pub const PHONE_SHOULD_BE_FIXED_LINE: &str = "phone_should_be_fixed_line";

// email
pub const EMAIL_CORRECT: &str = "email_correct";
pub const EMAIL_NOT_CORRECT: &str = "email_not_correct";
pub const EMAIL_SYNTAX_ERROR: &str = "email_syntax_error";
pub const EMAIL_NO_MX: &str = "email_no_mx";
pub const EMAIL_CANT_RECEIVE: &str = "email_cant_receive";
pub const EMAIL_DISPOSABLE: &str = "email_disposable";
