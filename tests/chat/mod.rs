mod api_tests;
mod delivery_tests;
mod presence_tests;
mod read_receipt_tests;
mod room_tests;
