mod attendance_test;
mod order_test;
mod verify_test;
